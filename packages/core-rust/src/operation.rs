//! Logical operations exposed by the Reflexian public API and the wire
//! request they translate to.

use http::{HeaderMap, Method};

/// Production host, with trailing slash.
pub const DEFAULT_BASE_URL: &str = "https://api.reflexian.com/";

/// Path prefix shared by every endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Header carrying the caller's API key on every request.
pub const API_KEY_HEADER: &str = "reflexian-api";

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A request kind. Defined once per kind, never per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LookupPlayer,
    LookupKey,
    LookupLicense,
    CreateLicense,
}

impl Operation {
    /// Resource segment following [`API_PREFIX`].
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::LookupPlayer => "player",
            Self::LookupKey => "key",
            Self::LookupLicense | Self::CreateLicense => "licenses",
        }
    }

    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::CreateLicense => Method::POST,
            Self::LookupPlayer | Self::LookupKey | Self::LookupLicense => Method::GET,
        }
    }

    /// Stable name used in spans and log events.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LookupPlayer => "lookup_player",
            Self::LookupKey => "lookup_key",
            Self::LookupLicense => "lookup_license",
            Self::CreateLicense => "create_license",
        }
    }

    /// Lookups address a single identifier in the path; creation does not.
    #[must_use]
    pub const fn takes_parameter(self) -> bool {
        !matches!(self, Self::CreateLicense)
    }
}

// ---------------------------------------------------------------------------
// WireRequest
// ---------------------------------------------------------------------------

/// Everything a transport needs to perform one HTTP exchange.
///
/// `path` is relative to the configured base URL and always starts with `/`.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub operation: Operation,
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}
