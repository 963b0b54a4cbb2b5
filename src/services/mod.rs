pub mod failure_writer;
pub mod validator;

pub use failure_writer::FailureWriter;
pub use validator::{ItemValidator, ValidationPolicy, Verdict};
