//! Reflexian Core — operation table, reply shapes, wire codecs, and reply
//! classification for the Reflexian public API. Performs no I/O.

pub mod classify;
pub mod error;
pub mod license;
pub mod operation;
pub mod reply;
pub mod translate;
pub mod wire;

pub use classify::{classify, classify_status, Rule, RULES};
pub use error::{FailureKind, ReflexianError};
pub use license::NewLicense;
pub use operation::{Operation, WireRequest, API_KEY_HEADER, DEFAULT_BASE_URL};
pub use reply::{KeyReply, LicenseReply, PlayerReply, Reply, ReplyStatus};
pub use translate::Lookup;
