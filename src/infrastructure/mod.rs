pub mod http_channel;
pub mod scripted_channel;
pub mod submission_channel;

pub use http_channel::HttpChannel;
pub use scripted_channel::{ScriptedChannel, SubmitCall};
pub use submission_channel::{Destination, SubmissionChannel, SubmitOutcome};
