//! The four-step flow: pick an age, pick a photo, wait, browse activities.
//!
//! ```text
//! AgeSelection -> ImageSelection -> AwaitingResponse -> ActivityDisplay
//!       ^                 ^               |  ^               |
//!       |                 +--- failure ---+  +-- generate ----+
//!       +------------------------ start_over -----------------+
//! ```

use crate::age::{DEFAULT_AGE_MONTHS, MAX_AGE_MONTHS};
use crate::client::Submitter;
use crate::error::SubmissionError;
use crate::photo::ImagePayload;
use service_core::models::ActivitySpec;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    AgeSelection,
    ImageSelection,
    AwaitingResponse,
    ActivityDisplay,
}

/// Language used when composing messages for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Chinese,
    English,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("A submission is already in progress")]
    Busy,

    #[error("Cannot {action} while in {step:?}")]
    InvalidTransition {
        action: &'static str,
        step: WizardStep,
    },

    #[error("Age must be between 0 and 36 months, got {0}")]
    AgeOutOfRange(u32),

    #[error("No image has been selected")]
    NoImage,

    #[error("No activities were generated")]
    NoActivities,

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

pub struct Wizard {
    step: WizardStep,
    locale: Locale,
    age_months: u32,
    image: Option<ImagePayload>,
    activities: Vec<ActivitySpec>,
    current: usize,
    last_error: Option<String>,
}

impl Wizard {
    pub fn new(locale: Locale) -> Self {
        Self {
            step: WizardStep::AgeSelection,
            locale,
            age_months: DEFAULT_AGE_MONTHS,
            image: None,
            activities: Vec::new(),
            current: 0,
            last_error: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn age_months(&self) -> u32 {
        self.age_months
    }

    pub fn activities(&self) -> &[ActivitySpec] {
        &self.activities
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_activity(&self) -> Option<&ActivitySpec> {
        self.activities.get(self.current)
    }

    /// Message from the most recent failed submission, localized.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Confirm the age and move on to picking a photo.
    pub fn select_age(&mut self, months: u32) -> Result<(), WizardError> {
        self.expect_step(WizardStep::AgeSelection, "select an age")?;
        if months > MAX_AGE_MONTHS {
            return Err(WizardError::AgeOutOfRange(months));
        }
        self.age_months = months;
        self.step = WizardStep::ImageSelection;
        Ok(())
    }

    /// Submit a photo. On failure the wizard goes back to photo selection so
    /// the user can retry.
    pub async fn submit_image<S: Submitter + ?Sized>(
        &mut self,
        image: ImagePayload,
        submitter: &S,
    ) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ImageSelection, "submit an image")?;

        self.image = Some(image);
        self.step = WizardStep::AwaitingResponse;

        match self.request(submitter).await {
            Ok(activities) => {
                self.show(activities);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                self.step = WizardStep::ImageSelection;
                Err(e)
            }
        }
    }

    /// Ask for a new set of activities for the same photo and age. On failure
    /// the previous activities stay on display.
    pub async fn generate_another<S: Submitter + ?Sized>(
        &mut self,
        submitter: &S,
    ) -> Result<(), WizardError> {
        self.expect_step(WizardStep::ActivityDisplay, "generate more activities")?;
        if self.image.is_none() {
            return Err(WizardError::NoImage);
        }

        self.step = WizardStep::AwaitingResponse;

        match self.request(submitter).await {
            Ok(activities) => {
                self.show(activities);
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                self.step = WizardStep::ActivityDisplay;
                Err(e)
            }
        }
    }

    /// Back to the first step, forgetting the photo and the activities.
    pub fn start_over(&mut self) {
        self.step = WizardStep::AgeSelection;
        self.image = None;
        self.activities.clear();
        self.current = 0;
        self.last_error = None;
    }

    pub fn next_activity(&mut self) -> Option<&ActivitySpec> {
        if self.step != WizardStep::ActivityDisplay || self.activities.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.activities.len();
        self.current_activity()
    }

    pub fn previous_activity(&mut self) -> Option<&ActivitySpec> {
        if self.step != WizardStep::ActivityDisplay || self.activities.is_empty() {
            return None;
        }
        self.current = self
            .current
            .checked_sub(1)
            .unwrap_or(self.activities.len() - 1);
        self.current_activity()
    }

    /// Flip the favorite flag of the activity on display. Kept in memory only.
    pub fn toggle_favorite(&mut self) -> Option<bool> {
        if self.step != WizardStep::ActivityDisplay {
            return None;
        }
        let activity = self.activities.get_mut(self.current)?;
        activity.is_favorited = !activity.is_favorited;
        Some(activity.is_favorited)
    }

    fn expect_step(&self, step: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == WizardStep::AwaitingResponse {
            return Err(WizardError::Busy);
        }
        if self.step != step {
            return Err(WizardError::InvalidTransition {
                action,
                step: self.step,
            });
        }
        Ok(())
    }

    async fn request<S: Submitter + ?Sized>(
        &self,
        submitter: &S,
    ) -> Result<Vec<ActivitySpec>, WizardError> {
        let image = self.image.as_ref().ok_or(WizardError::NoImage)?;
        let activities = submitter.submit(image, self.age_months).await?;
        if activities.is_empty() {
            return Err(WizardError::NoActivities);
        }
        Ok(activities)
    }

    fn show(&mut self, activities: Vec<ActivitySpec>) {
        self.activities = activities;
        self.current = 0;
        self.last_error = None;
        self.step = WizardStep::ActivityDisplay;
    }

    fn fail(&mut self, err: &WizardError) {
        tracing::warn!(error = %err, "Activity generation failed");
        let message = match self.locale {
            Locale::Chinese => format!("生成游戏失败: {}", err),
            Locale::English => format!("Failed to generate activities: {}", err),
        };
        self.last_error = Some(message);
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Pops one scripted outcome per call.
    struct ScriptedSubmitter {
        outcomes: Mutex<Vec<Result<Vec<ActivitySpec>, SubmissionError>>>,
        calls: AtomicUsize,
        last_age: Mutex<Option<u32>>,
    }

    impl ScriptedSubmitter {
        fn new(mut outcomes: Vec<Result<Vec<ActivitySpec>, SubmissionError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicUsize::new(0),
                last_age: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Submitter for ScriptedSubmitter {
        async fn submit(
            &self,
            _image: &ImagePayload,
            age_months: u32,
        ) -> Result<Vec<ActivitySpec>, SubmissionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_age.lock().unwrap() = Some(age_months);
            self.outcomes.lock().unwrap().pop().expect("no scripted outcome left")
        }
    }

    fn activity(id: &str) -> ActivitySpec {
        serde_json::from_value(json!({ "id": id, "name": format!("Game {}", id) })).unwrap()
    }

    fn image() -> ImagePayload {
        ImagePayload::new(vec![0xFF, 0xD8, 0xFF], "toy.jpg", "image/jpeg")
    }

    fn relay_error(message: &str) -> SubmissionError {
        SubmissionError::Relay {
            status: 500,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_happy_path() {
        let submitter = ScriptedSubmitter::new(vec![Ok(vec![activity("a1"), activity("a2")])]);
        let mut wizard = Wizard::new(Locale::English);

        wizard.select_age(18).unwrap();
        assert_eq!(wizard.step(), WizardStep::ImageSelection);

        wizard.submit_image(image(), &submitter).await.unwrap();
        assert_eq!(wizard.step(), WizardStep::ActivityDisplay);
        assert_eq!(wizard.activities().len(), 2);
        assert_eq!(*submitter.last_age.lock().unwrap(), Some(18));
    }

    #[tokio::test]
    async fn test_failure_returns_to_image_selection() {
        let submitter = ScriptedSubmitter::new(vec![Err(relay_error("Invalid key"))]);
        let mut wizard = Wizard::new(Locale::Chinese);
        wizard.select_age(12).unwrap();

        let result = wizard.submit_image(image(), &submitter).await;

        assert!(matches!(result, Err(WizardError::Submission(_))));
        assert_eq!(wizard.step(), WizardStep::ImageSelection);
        assert_eq!(wizard.last_error(), Some("生成游戏失败: Invalid key"));
    }

    #[tokio::test]
    async fn test_empty_list_is_a_failure() {
        let submitter = ScriptedSubmitter::new(vec![Ok(vec![])]);
        let mut wizard = Wizard::new(Locale::English);
        wizard.select_age(12).unwrap();

        let result = wizard.submit_image(image(), &submitter).await;

        assert!(matches!(result, Err(WizardError::NoActivities)));
        assert_eq!(wizard.step(), WizardStep::ImageSelection);
    }

    #[tokio::test]
    async fn test_generate_another_reuses_image_and_age() {
        let submitter = ScriptedSubmitter::new(vec![
            Ok(vec![activity("a1")]),
            Ok(vec![activity("b1"), activity("b2")]),
            Err(relay_error("Provider down")),
        ]);
        let mut wizard = Wizard::new(Locale::English);
        wizard.select_age(30).unwrap();
        wizard.submit_image(image(), &submitter).await.unwrap();

        wizard.generate_another(&submitter).await.unwrap();
        assert_eq!(wizard.current_activity().unwrap().id, "b1");
        assert_eq!(*submitter.last_age.lock().unwrap(), Some(30));

        let result = wizard.generate_another(&submitter).await;
        assert!(result.is_err());
        assert_eq!(wizard.step(), WizardStep::ActivityDisplay);
        assert_eq!(wizard.activities().len(), 2);
        assert_eq!(
            wizard.last_error(),
            Some("Failed to generate activities: Provider down")
        );
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_browse_and_favorite() {
        let submitter = ScriptedSubmitter::new(vec![Ok(vec![
            activity("a1"),
            activity("a2"),
            activity("a3"),
        ])]);
        let mut wizard = Wizard::default();
        wizard.select_age(6).unwrap();
        wizard.submit_image(image(), &submitter).await.unwrap();

        assert_eq!(wizard.previous_activity().unwrap().id, "a3");
        assert_eq!(wizard.next_activity().unwrap().id, "a1");
        assert_eq!(wizard.next_activity().unwrap().id, "a2");

        assert_eq!(wizard.toggle_favorite(), Some(true));
        assert!(wizard.activities()[1].is_favorited);
        assert_eq!(wizard.toggle_favorite(), Some(false));
    }

    #[tokio::test]
    async fn test_start_over_clears_state() {
        let submitter = ScriptedSubmitter::new(vec![Ok(vec![activity("a1")])]);
        let mut wizard = Wizard::default();
        wizard.select_age(6).unwrap();
        wizard.submit_image(image(), &submitter).await.unwrap();

        wizard.start_over();

        assert_eq!(wizard.step(), WizardStep::AgeSelection);
        assert!(wizard.activities().is_empty());
        assert!(matches!(
            wizard.generate_another(&submitter).await,
            Err(WizardError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut wizard = Wizard::default();
        assert!(matches!(
            wizard.select_age(37),
            Err(WizardError::AgeOutOfRange(37))
        ));
        assert_eq!(wizard.toggle_favorite(), None);

        wizard.select_age(12).unwrap();
        assert!(matches!(
            wizard.select_age(13),
            Err(WizardError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_abandoned_submission_blocks_resubmission() {
        let submitter = ScriptedSubmitter::new(vec![Ok(vec![activity("a1")])]);
        let mut wizard = Wizard::default();
        wizard.select_age(12).unwrap();
        wizard.step = WizardStep::AwaitingResponse;

        let result = wizard.submit_image(image(), &submitter).await;

        assert!(matches!(result, Err(WizardError::Busy)));
        assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);

        wizard.start_over();
        assert_eq!(wizard.step(), WizardStep::AgeSelection);
    }
}
