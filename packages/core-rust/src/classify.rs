//! Reply classification: turns status signals embedded in a decoded reply
//! into a distinguished failure.
//!
//! Rules are evaluated in [`RULES`] order and the first match wins.
//! Rate limiting and key revocation come before the generic `success` flag
//! so they surface even when the server also marks the call unsuccessful.
//! The license-key rule is last and only fires on otherwise successful
//! replies.

use crate::error::ReflexianError;
use crate::reply::{Reply, ReplyStatus};

/// One classification rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&ReplyStatus) -> bool,
    pub failure: fn(&ReplyStatus) -> ReflexianError,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Classification rules in precedence order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "throttled",
        applies: is_throttled,
        failure: throttled,
    },
    Rule {
        name: "blacklisted",
        applies: is_blacklisted,
        failure: blacklisted,
    },
    Rule {
        name: "unsuccessful",
        applies: is_unsuccessful,
        failure: rejected,
    },
    Rule {
        name: "license-key-error",
        applies: is_license_key_error,
        failure: not_license_key,
    },
];

fn is_throttled(s: &ReplyStatus) -> bool {
    s.throttled
}

fn is_blacklisted(s: &ReplyStatus) -> bool {
    s.blacklisted
}

fn is_unsuccessful(s: &ReplyStatus) -> bool {
    !s.success
}

fn is_license_key_error(s: &ReplyStatus) -> bool {
    s.license_key_error
}

fn throttled(_: &ReplyStatus) -> ReflexianError {
    ReflexianError::Throttled
}

fn blacklisted(_: &ReplyStatus) -> ReflexianError {
    ReflexianError::Blacklisted
}

fn rejected(s: &ReplyStatus) -> ReflexianError {
    ReflexianError::Rejected {
        cause: s.cause.clone().unwrap_or_default(),
    }
}

fn not_license_key(_: &ReplyStatus) -> ReflexianError {
    ReflexianError::NotLicenseKey
}

/// First rule matching `status`, if any.
#[must_use]
pub fn matching_rule(status: &ReplyStatus) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.applies)(status))
}

/// The failure `status` maps to, or `None` for a clean reply.
#[must_use]
pub fn classify_status(status: &ReplyStatus) -> Option<ReflexianError> {
    matching_rule(status).map(|rule| {
        tracing::debug!(rule = rule.name, "reply classified as failure");
        (rule.failure)(status)
    })
}

/// Pass a clean reply through unchanged, or convert it into its failure.
///
/// # Errors
///
/// Returns the failure of the first matching rule in [`RULES`].
pub fn classify<R: Reply>(reply: R) -> Result<R, ReflexianError> {
    match classify_status(reply.status()) {
        Some(err) => Err(err),
        None => Ok(reply),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
