//! Failure taxonomy shared by every Reflexian operation.
//!
//! A call either yields its typed reply or exactly one `ReflexianError`.
//! Callers branch on [`ReflexianError::kind`] when they only care about the
//! category.

/// Category of a failed call, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Bad caller input, detected before any network activity.
    Validation,
    /// Connection, I/O, or decode failure, or a missing reply body.
    Transport,
    /// The API key is being rate limited.
    Throttled,
    /// The API key has been revoked.
    Blacklisted,
    /// The service explicitly rejected the request.
    Rejected,
    /// The looked-up identifier is not a license key.
    NotLicenseKey,
}

/// Errors surfaced through a pending call.
#[derive(Debug, thiserror::Error)]
pub enum ReflexianError {
    #[error("invalid request: {message}")]
    Validation { message: String },
    #[error("transport failure: {0:#}")]
    Transport(#[source] anyhow::Error),
    #[error("API key is throttled")]
    Throttled,
    #[error("API key is blacklisted")]
    Blacklisted,
    #[error("request rejected by server: {cause}")]
    Rejected { cause: String },
    #[error("identifier is not a license key")]
    NotLicenseKey,
}

impl ReflexianError {
    /// Build a `Validation` error from any message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The server answered without a body, or with a JSON `null`.
    #[must_use]
    pub fn empty_reply() -> Self {
        Self::Transport(anyhow::anyhow!("server returned an empty reply"))
    }

    /// Category of this failure.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation { .. } => FailureKind::Validation,
            Self::Transport(_) => FailureKind::Transport,
            Self::Throttled => FailureKind::Throttled,
            Self::Blacklisted => FailureKind::Blacklisted,
            Self::Rejected { .. } => FailureKind::Rejected,
            Self::NotLicenseKey => FailureKind::NotLicenseKey,
        }
    }
}

impl From<anyhow::Error> for ReflexianError {
    fn from(err: anyhow::Error) -> Self {
        Self::Transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(ReflexianError::validation("x").kind(), FailureKind::Validation);
        assert_eq!(ReflexianError::empty_reply().kind(), FailureKind::Transport);
        assert_eq!(ReflexianError::Throttled.kind(), FailureKind::Throttled);
        assert_eq!(ReflexianError::Blacklisted.kind(), FailureKind::Blacklisted);
        assert_eq!(
            ReflexianError::Rejected {
                cause: "nope".to_string()
            }
            .kind(),
            FailureKind::Rejected
        );
        assert_eq!(ReflexianError::NotLicenseKey.kind(), FailureKind::NotLicenseKey);
    }

    #[test]
    fn transport_display_includes_cause_chain() {
        let err: ReflexianError = anyhow::anyhow!("connection reset")
            .context("sending GET /api/v1/player/abc")
            .into();
        let text = err.to_string();
        assert!(text.contains("sending GET /api/v1/player/abc"));
        assert!(text.contains("connection reset"));
    }

    #[test]
    fn rejected_display_carries_cause() {
        let err = ReflexianError::Rejected {
            cause: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "request rejected by server: quota exceeded");
    }
}
