pub mod activity;

pub use activity::{ActivityRecord, ActivitySpec, ActivityStep, GenerateIdeasResponse};
