//! Payload for `POST /api/v1/licenses/`.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ReflexianError;
use crate::wire::zoned_opt;

/// A license to be created by the service.
///
/// ```
/// use reflexian_core::NewLicense;
/// use uuid::Uuid;
///
/// let json = NewLicense::new("prison", Uuid::nil())
///     .with_max_ips(2)
///     .to_json()
///     .unwrap();
/// assert!(json.contains(r#""maxIps":2"#));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLicense {
    pub product: String,
    pub owner: Uuid,
    #[serde(with = "zoned_opt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ips: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NewLicense {
    /// A permanent license with no IP limit.
    pub fn new(product: impl Into<String>, owner: Uuid) -> Self {
        Self {
            product: product.into(),
            owner,
            expires_at: None,
            max_ips: None,
            note: None,
        }
    }

    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<FixedOffset>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn with_max_ips(mut self, max_ips: u32) -> Self {
        self.max_ips = Some(max_ips);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Serialize to the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns `ReflexianError::Validation` if the product name is empty.
    pub fn to_json(&self) -> Result<String, ReflexianError> {
        if self.product.is_empty() {
            return Err(ReflexianError::validation("license product must not be empty"));
        }
        serde_json::to_string(self)
            .map_err(|e| ReflexianError::validation(format!("unserializable license: {e}")))
    }
}
