//! Request extractors for the prediction endpoints.
//!
//! Both extractors reject with [`ApiError::Input`], so malformed uploads get
//! the same `{"error": ...}` body as any other failure.

use std::collections::HashMap;

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use agri_models::SoilReading;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

/// An image uploaded as the `file` field of a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Log what was uploaded, before any decoding.
    pub fn log_received(&self, endpoint: &str) {
        debug!(
            endpoint,
            file_name = self.file_name.as_deref().unwrap_or("-"),
            content_type = self.content_type.as_deref().unwrap_or("-"),
            bytes = self.bytes.len(),
            "Image upload received"
        );
    }
}

#[async_trait]
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::input(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::input(e.body_text()))?
        {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }

            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::input(e.body_text()))?;

            return Ok(Self {
                file_name,
                content_type,
                bytes,
            });
        }

        Err(ApiError::input(format!("missing form field: {}", UPLOAD_FIELD)))
    }
}

/// Soil readings sent as form fields, multipart or urlencoded.
#[derive(Debug, Clone, Copy)]
pub struct SoilForm(pub SoilReading);

#[async_trait]
impl<S> FromRequest<S> for SoilForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        let fields = if is_multipart {
            multipart_text_fields(req, state).await?
        } else {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::input(e.body_text()))?;
            fields
        };

        reading_from_fields(&fields).map(SoilForm)
    }
}

async fn multipart_text_fields<S>(req: Request, state: &S) -> ApiResult<HashMap<String, String>>
where
    S: Send + Sync,
{
    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| ApiError::input(e.body_text()))?;

    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::input(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::input(e.body_text()))?;
        fields.insert(name, value);
    }

    Ok(fields)
}

/// Build a reading from raw form fields. All four fields are required.
pub fn reading_from_fields(fields: &HashMap<String, String>) -> ApiResult<SoilReading> {
    Ok(SoilReading::new(
        number_field(fields, "moisture")?,
        number_field(fields, "nitrogen")?,
        number_field(fields, "phosphorus")?,
        number_field(fields, "potassium")?,
    ))
}

fn number_field(fields: &HashMap<String, String>, name: &str) -> ApiResult<f64> {
    let raw = fields
        .get(name)
        .ok_or_else(|| ApiError::input(format!("missing form field: {}", name)))?;

    raw.trim()
        .parse::<f64>()
        .map_err(|_| ApiError::input(format!("{} must be a number, got {:?}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_reading_from_fields() {
        let reading = reading_from_fields(&fields(&[
            ("moisture", "30"),
            ("nitrogen", " 30.5 "),
            ("phosphorus", "25"),
            ("potassium", "1e1"),
        ]))
        .unwrap();
        assert_eq!(reading, SoilReading::new(30.0, 30.5, 25.0, 10.0));
    }

    #[test]
    fn test_missing_field() {
        let err = reading_from_fields(&fields(&[
            ("moisture", "30"),
            ("nitrogen", "30"),
            ("phosphorus", "25"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: missing form field: potassium");
    }

    #[test]
    fn test_non_numeric_field() {
        let err = reading_from_fields(&fields(&[
            ("moisture", "wet"),
            ("nitrogen", "30"),
            ("phosphorus", "25"),
            ("potassium", "25"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Input(_)));
        assert!(err.to_string().contains("moisture"));
    }
}
