pub mod submission;

pub use service_core::models::{ActivityRecord, GenerateIdeasResponse};
pub use submission::SubmissionRequest;
