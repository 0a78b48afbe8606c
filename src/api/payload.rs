//! Request bodies forwarded to the record services

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderValue},
};
use serde_json::{Map, Value};

use crate::error::AppError;

/// Inbound body re-encoded as the JSON the backends accept
///
/// Form-encoded bodies become a JSON object of string values, with repeated
/// keys collected into an array. Any other body is forwarded untouched.
#[derive(Debug, Clone)]
pub struct ForwardBody(pub Bytes);

#[async_trait]
impl<S> FromRequest<S> for ForwardBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = is_form(req.headers().get(CONTENT_TYPE));
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidBody(e.body_text()))?;

        if form {
            Ok(Self(form_to_json(&body)?))
        } else {
            Ok(Self(body))
        }
    }
}

fn is_form(content_type: Option<&HeaderValue>) -> bool {
    content_type
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

/// Decode `a=1&b=2` into `{"a":"1","b":"2"}`
pub fn form_to_json(body: &[u8]) -> Result<Bytes, AppError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_bytes(body).map_err(|e| AppError::InvalidBody(e.to_string()))?;

    let mut object = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match object.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key, value);
            }
        }
    }

    Ok(Bytes::from(Value::Object(object).to_string()))
}
