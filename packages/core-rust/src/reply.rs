//! Reply shapes returned by the lookup endpoints.
//!
//! Every shape carries the same [`ReplyStatus`] signals flattened into its
//! JSON object, next to its domain fields. All fields default when absent,
//! and non-optional fields also treat `null` as absent, so decoding succeeds
//! structurally on any JSON object and classification decides whether the
//! call succeeded.

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReflexianError;
use crate::wire::{null_as_default, zoned_opt};

// ---------------------------------------------------------------------------
// Status signals
// ---------------------------------------------------------------------------

/// Status signals embedded in every lookup reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReplyStatus {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub throttled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub blacklisted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub license_key_error: bool,
}

impl ReplyStatus {
    /// A status with no failure signal raised.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }
}

/// Common access to the status signals of any reply shape.
pub trait Reply: DeserializeOwned + Send + 'static {
    fn status(&self) -> &ReplyStatus;
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// `GET /api/v1/player/{uuid}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerReply {
    #[serde(flatten)]
    pub status: ReplyStatus,
    pub uuid: Option<Uuid>,
    pub name: Option<String>,
    /// License keys owned by the player.
    #[serde(deserialize_with = "null_as_default")]
    pub keys: Vec<Uuid>,
    #[serde(with = "zoned_opt")]
    pub first_join: Option<DateTime<FixedOffset>>,
    #[serde(with = "zoned_opt")]
    pub last_join: Option<DateTime<FixedOffset>>,
}

/// `GET /api/v1/key/{key}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyReply {
    #[serde(flatten)]
    pub status: ReplyStatus,
    pub key: Option<Uuid>,
    pub owner: Option<Uuid>,
    pub product: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub redeemed: bool,
    #[serde(with = "zoned_opt")]
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// `GET /api/v1/licenses/{uuid}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LicenseReply {
    #[serde(flatten)]
    pub status: ReplyStatus,
    pub uuid: Option<Uuid>,
    pub owner: Option<Uuid>,
    pub product: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
    pub max_ips: Option<u32>,
    #[serde(with = "zoned_opt")]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(with = "zoned_opt")]
    pub expires_at: Option<DateTime<FixedOffset>>,
}

impl Reply for PlayerReply {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }
}

impl Reply for KeyReply {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }
}

impl Reply for LicenseReply {
    fn status(&self) -> &ReplyStatus {
        &self.status
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a raw response body into the reply shape `R`.
///
/// The shape is chosen by the caller, never inferred from the payload.
///
/// # Errors
///
/// Returns `ReflexianError::Transport` when the body is not JSON, is JSON
/// `null`, is not an object, or holds a field of the wrong type.
pub fn decode_reply<R: Reply>(raw: &[u8]) -> Result<R, ReflexianError> {
    let value: serde_json::Value = serde_json::from_slice(raw)
        .map_err(|e| ReflexianError::Transport(anyhow::Error::new(e).context("malformed JSON reply")))?;

    if value.is_null() {
        return Err(ReflexianError::empty_reply());
    }
    if !value.is_object() {
        return Err(ReflexianError::Transport(anyhow::anyhow!(
            "expected a JSON object reply"
        )));
    }

    serde_json::from_value(value).map_err(|e| {
        ReflexianError::Transport(anyhow::Error::new(e).context(format!(
            "reply does not fit {}",
            std::any::type_name::<R>()
        )))
    })
}
