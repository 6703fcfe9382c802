use bytes::Bytes;

/// An image and age accepted from a client, ready to forward to the provider.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub age_months: u32,
    pub image: Bytes,
    pub filename: String,
    pub content_type: String,
}
