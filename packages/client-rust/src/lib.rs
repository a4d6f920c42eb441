//! Reflexian Client — asynchronous, typed access to the Reflexian public API
//! (player, key and license lookups, license creation).
//!
//! Every operation returns a [`PendingCall`] immediately; the network call
//! runs on the tokio runtime and the handle resolves to either the typed
//! reply or a classified [`ReflexianError`].
//!
//! ```no_run
//! use reflexian_client::{ClientConfig, ReflexianClient};
//!
//! # async fn run() -> Result<(), reflexian_client::ReflexianError> {
//! let client = ReflexianClient::new(ClientConfig::new("my-api-key"))?;
//! let player = client
//!     .lookup_player("123e4567-e89b-12d3-a456-426614174000")
//!     .await?;
//! println!("{:?}", player.name);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod transport;

pub use client::ReflexianClient;
pub use config::{ClientConfig, ConfigError};
pub use dispatcher::{Completer, Dispatcher, Outcome, PendingCall};
pub use reflexian_core::{
    FailureKind, KeyReply, LicenseReply, NewLicense, PlayerReply, ReflexianError, ReplyStatus,
};
pub use transport::{ReqwestTransport, Transport};
