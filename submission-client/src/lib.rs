//! Client side of the playtime relay: prepares a toy photo, submits it with
//! the baby's age, and drives the selection wizard.
pub mod age;
pub mod client;
pub mod error;
pub mod photo;
pub mod wizard;

pub use client::{SubmissionClient, Submitter};
pub use error::SubmissionError;
pub use photo::{downscale, DownscaleOptions, ImagePayload};
pub use wizard::{Locale, Wizard, WizardError, WizardStep};
