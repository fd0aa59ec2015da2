//! Request extractors whose rejections render through [`ApiError`].

use crate::error::ApiError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use axum::Form;
use std::collections::HashMap;

/// Text fields of a form, sent either as `multipart/form-data` or as
/// `application/x-www-form-urlencoded`.
#[derive(Debug, Default)]
pub struct FormFields(pub HashMap<String, String>);

impl FormFields {
    pub fn take(&mut self, name: &'static str) -> Option<String> {
        self.0.remove(name)
    }

    /// Like [`take`](Self::take) but a missing field is an error.
    pub fn require(&mut self, name: &'static str) -> Result<String, ApiError> {
        self.take(name).ok_or(ApiError::MissingField(name))
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state).await?;
            return read_text_parts(multipart).await.map(FormFields);
        }

        let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state).await?;
        Ok(FormFields(fields))
    }
}

/// `Multipart` whose rejection is an [`ApiError`].
pub struct Upload(pub Multipart);

impl<S> FromRequest<S> for Upload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Upload(Multipart::from_request(req, state).await?))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Collect every named part as text. Later duplicates win.
async fn read_text_parts(mut multipart: Multipart) -> Result<HashMap<String, String>, ApiError> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        fields.insert(name, field.text().await?);
    }
    Ok(fields)
}
