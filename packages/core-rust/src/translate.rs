//! Request/response translation per operation.
//!
//! Each lookup is an entry of a static table pairing an [`Operation`] with
//! the decode function of its reply shape, so the shape a response decodes
//! into is fixed by which operation was requested.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::ReflexianError;
use crate::operation::{Operation, WireRequest, API_KEY_HEADER, API_PREFIX};
use crate::reply::{decode_reply, KeyReply, LicenseReply, PlayerReply, Reply};

/// Bytes escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Decoder from raw response bytes into a reply shape.
pub type DecodeFn<R> = fn(&[u8]) -> Result<R, ReflexianError>;

/// A lookup operation bound to its reply shape.
#[derive(Debug)]
pub struct Lookup<R> {
    pub operation: Operation,
    pub decode: DecodeFn<R>,
}

// Manual impls: derive would require `R: Clone`.
impl<R> Clone for Lookup<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Lookup<R> {}

pub const PLAYER: Lookup<PlayerReply> = Lookup {
    operation: Operation::LookupPlayer,
    decode: decode_reply::<PlayerReply>,
};

pub const KEY: Lookup<KeyReply> = Lookup {
    operation: Operation::LookupKey,
    decode: decode_reply::<KeyReply>,
};

pub const LICENSE: Lookup<LicenseReply> = Lookup {
    operation: Operation::LookupLicense,
    decode: decode_reply::<LicenseReply>,
};

impl<R: Reply> Lookup<R> {
    /// Build `GET /api/v1/<resource>/<parameter>`, percent-encoding
    /// `parameter` as a single path segment.
    ///
    /// # Errors
    ///
    /// Returns `ReflexianError::Validation` if `parameter` is empty or if
    /// `api_key` is not a legal header value.
    pub fn build_request(&self, api_key: &str, parameter: &str) -> Result<WireRequest, ReflexianError> {
        if parameter.is_empty() {
            return Err(ReflexianError::validation("lookup parameter must not be empty"));
        }
        Ok(WireRequest {
            operation: self.operation,
            method: self.operation.method(),
            path: format!(
                "{API_PREFIX}/{}/{}",
                self.operation.resource(),
                utf8_percent_encode(parameter, PATH_SEGMENT)
            ),
            headers: api_key_headers(api_key)?,
            body: None,
        })
    }
}

/// Build `POST /api/v1/licenses/` carrying `json` as its body.
///
/// # Errors
///
/// Returns `ReflexianError::Validation` if `api_key` is not a legal header
/// value.
pub fn build_create_request(api_key: &str, json: String) -> Result<WireRequest, ReflexianError> {
    let operation = Operation::CreateLicense;
    let mut headers = api_key_headers(api_key)?;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(WireRequest {
        operation,
        method: operation.method(),
        path: format!("{API_PREFIX}/{}/", operation.resource()),
        headers,
        body: Some(json),
    })
}

/// Decode a license-creation response.
///
/// On success the reply is returned re-serialized in canonical compact form.
///
/// # Errors
///
/// - `ReflexianError::Rejected` carrying the server's `cause` when `success`
///   is false.
/// - `ReflexianError::Transport` when the body is not a JSON object or
///   lacks a boolean `success` field.
pub fn decode_created(raw: &[u8]) -> Result<String, ReflexianError> {
    let value: serde_json::Value = serde_json::from_slice(raw)
        .map_err(|e| ReflexianError::Transport(anyhow::Error::new(e).context("malformed JSON reply")))?;

    if value.is_null() {
        return Err(ReflexianError::empty_reply());
    }

    match value.get("success").and_then(serde_json::Value::as_bool) {
        Some(true) => Ok(value.to_string()),
        Some(false) => Err(ReflexianError::Rejected {
            cause: value
                .get("cause")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        None => Err(ReflexianError::Transport(anyhow::anyhow!(
            "license creation reply has no boolean `success` field"
        ))),
    }
}

fn api_key_headers(api_key: &str) -> Result<HeaderMap, ReflexianError> {
    let mut value = HeaderValue::from_str(api_key)
        .map_err(|_| ReflexianError::validation("API key is not a valid header value"))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(API_KEY_HEADER, value);
    Ok(headers)
}
