pub mod candidate;
pub mod item;
pub mod loaders;
pub mod report;

pub use candidate::{CandidateItem, ContentKind, PayloadHandle};
pub use item::{AcceptedItem, ItemId, ItemState};
pub use loaders::{load_candidate, load_candidates};
pub use report::{BatchReport, ItemOutcome, Rejection, SubmissionSummary};
