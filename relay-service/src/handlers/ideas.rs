use crate::models::{ActivityRecord, GenerateIdeasResponse, SubmissionRequest};
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use service_core::error::AppError;

const MISSING_FIELDS: &str = "Image file and age are required";

/// Raw `image` and `age` parts read from the multipart body.
#[derive(Debug, Default)]
struct IdeasForm {
    image: Option<Bytes>,
    filename: Option<String>,
    content_type: Option<String>,
    age: Option<String>,
}

impl IdeasForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = IdeasForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error("Failed to read multipart field", e))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    form.filename = field.file_name().map(str::to_string);
                    form.content_type = field.content_type().map(str::to_string);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error("Failed to read image bytes", e))?;
                    form.image = Some(data);
                }
                "age" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read age field", e))?;
                    form.age = Some(text);
                }
                other => {
                    tracing::debug!(field = %other, "Ignoring unexpected multipart field");
                }
            }
        }

        Ok(form)
    }

    fn into_request(self, max_image_bytes: usize) -> Result<SubmissionRequest, AppError> {
        let image = self.image.filter(|bytes| !bytes.is_empty());
        let age = self
            .age
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());

        let (image, age) = match (image, age) {
            (Some(image), Some(age)) => (image, age),
            (image, age) => {
                tracing::warn!(
                    has_image = image.is_some(),
                    has_age = age.is_some(),
                    "Request validation failed"
                );
                return Err(AppError::BadRequest(anyhow::anyhow!(MISSING_FIELDS)));
            }
        };

        if image.len() > max_image_bytes {
            tracing::warn!(size = image.len(), limit = max_image_bytes, "Image too large");
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds the {} byte limit",
                max_image_bytes
            )));
        }

        let age_months = age.parse::<u32>().map_err(|_| {
            AppError::BadRequest(anyhow::anyhow!(
                "Age must be a non-negative whole number of months"
            ))
        })?;

        Ok(SubmissionRequest {
            age_months,
            image,
            filename: self.filename.unwrap_or_else(|| "image".to_string()),
            content_type: self
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        })
    }
}

/// A body cut off by the size limit is a 413; any other parse failure is a 400.
fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, err.body_text()))
    } else {
        AppError::BadRequest(anyhow::anyhow!("{}: {}", context, err))
    }
}

/// `POST /generate-ideas`: multipart `image` + `age` in, activity list out.
pub async fn generate_ideas(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateIdeasResponse<ActivityRecord>>, AppError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!(error = %e, "Rejected non-multipart request");
        AppError::BadRequest(anyhow::anyhow!(MISSING_FIELDS))
    })?;

    let request = IdeasForm::read(&mut multipart)
        .await?
        .into_request(state.config.max_upload_bytes)?;

    tracing::info!(
        age_months = request.age_months,
        filename = %request.filename,
        content_type = %request.content_type,
        size = request.image.len(),
        "Generating activities"
    );

    let activities = state.relay.generate(&request).await.map_err(|e| {
        tracing::error!(error = %e, "Error in generate-ideas");
        AppError::from(e)
    })?;

    Ok(Json(GenerateIdeasResponse { activities }))
}
