//! Response envelope shared by every endpoint.
//!
//! # Design
//! The API wraps payloads as `{"data": ..., "meta": {"pagination": ...}}`,
//! sometimes with a `status_code` echoed in the body. `ResponseEnvelope`
//! decodes the body once and exposes those pieces; it is immutable after
//! construction.
//!
//! `new` is lenient: an undecodable body yields an empty envelope with the
//! decoder message in `decode_error()` instead of an error, so listing code
//! written against the envelope never has to special-case garbage from a
//! proxy. Callers that want a hard failure use `try_new`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::pagination::Pagination;

#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    request: HttpRequest,
    response: Value,
    data: Value,
    pagination: Option<Pagination>,
    http_status: Option<u16>,
    decode_error: Option<String>,
}

impl ResponseEnvelope {
    /// Decode `body`, degrading to an empty envelope on malformed JSON.
    pub fn new(request: HttpRequest, body: &str) -> Self {
        match decode(body) {
            Ok(response) => Self::from_value(request, response),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "undecodable response body");
                let mut envelope = Self::from_value(request, Value::Object(Map::new()));
                envelope.decode_error = Some(e.to_string());
                envelope
            }
        }
    }

    /// Decode `body`, failing with `MalformedResponse` on malformed JSON.
    pub fn try_new(request: HttpRequest, body: &str) -> Result<Self, ApiError> {
        let response = decode(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
        Ok(Self::from_value(request, response))
    }

    /// `new` plus the transport-level status of the exchange.
    pub fn from_response(request: HttpRequest, response: HttpResponse) -> Self {
        let mut envelope = Self::new(request, &response.body);
        envelope.http_status = Some(response.status);
        envelope
    }

    fn from_value(request: HttpRequest, response: Value) -> Self {
        let data = match response.get("data") {
            Some(data) if !data.is_null() => data.clone(),
            _ => Value::Array(Vec::new()),
        };
        let pagination = response
            .get("meta")
            .and_then(|meta| meta.get("pagination"))
            .filter(|p| !p.is_null())
            .map(Pagination::from_value);
        Self {
            request,
            response,
            data,
            pagination,
            http_status: None,
            decode_error: None,
        }
    }

    /// The `data` key verbatim, or an empty array when absent.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Deserialize the `data` key into `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    /// The `meta` subtree, `Null` when absent.
    pub fn meta(&self) -> &Value {
        self.response.get("meta").unwrap_or(&Value::Null)
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.as_ref().is_some_and(Pagination::has_next_page)
    }

    pub fn next_page(&self) -> Option<u64> {
        self.pagination.as_ref().and_then(Pagination::next_page)
    }

    /// The `status_code` echoed in the body; `0` means unknown.
    pub fn status_code(&self) -> u16 {
        self.response
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(0)
    }

    /// Status of the HTTP exchange, when built through `from_response`.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// The whole decoded body.
    pub fn response(&self) -> &Value {
        &self.response
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn decode_error(&self) -> Option<&str> {
        self.decode_error.as_deref()
    }

    pub fn is_malformed(&self) -> bool {
        self.decode_error.is_some()
    }
}

/// An empty body decodes to an empty object (204 responses).
fn decode(body: &str) -> Result<Value, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(body)
}
