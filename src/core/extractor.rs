use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::shared::constants::SESSION_COOKIE_NAME;

/// Custom JSON extractor that provides consistent error responses
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(value) => Ok(Self(value.0)),
            Err(rejection) => Err(AppJsonRejection(rejection)),
        }
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

/// Session id carried by the browser cookie, if any.
///
/// Extraction never rejects; an absent or malformed cookie yields `None`
/// and handlers decide whether that is an error.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookie(pub Option<Uuid>);

impl<S> FromRequestParts<S> for SessionCookie
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionCookie(session_id_from_headers(&parts.headers)))
    }
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|part| {
                let (name, value) = part.trim().split_once('=')?;
                if name == SESSION_COOKIE_NAME {
                    Some(value.trim().to_string())
                } else {
                    None
                }
            })
        })
        .and_then(|value| Uuid::parse_str(&value).ok())
}

/// First client IP from proxy headers, if present
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extracts_session_id_from_cookie() {
        let id = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("gdpr-session={}", id));

        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_extracts_session_id_among_other_cookies() {
        let id = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("theme=dark; gdpr-session={} ; lang=en", id));

        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_missing_cookie_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);

        let headers = headers_with_cookie("theme=dark; lang=en");
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn test_malformed_session_id_yields_none() {
        let headers = headers_with_cookie("gdpr-session=not-a-uuid");
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.10, 10.0.0.2"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));

        assert_eq!(client_ip(&headers), Some("203.0.113.10".to_string()));
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));

        assert_eq!(client_ip(&headers), Some("198.51.100.7".to_string()));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
