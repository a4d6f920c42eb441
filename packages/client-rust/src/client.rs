//! Public client: one method per Reflexian operation, each returning a
//! `PendingCall` immediately.

use std::sync::Arc;

use reflexian_core::translate::{self, Lookup};
use reflexian_core::{
    classify, KeyReply, LicenseReply, NewLicense, Operation, PlayerReply, ReflexianError, Reply,
    WireRequest,
};
use tracing::{debug, info_span, warn, Instrument};

use crate::config::ClientConfig;
use crate::dispatcher::{Dispatcher, Outcome, PendingCall};
use crate::transport::{ReqwestTransport, Transport};

/// Asynchronous client for the Reflexian public API.
///
/// Cheap to clone; clones share the transport and the dispatcher.
#[derive(Clone)]
pub struct ReflexianClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for ReflexianClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflexianClient")
            .field("config", &self.inner.config)
            .field("dispatcher", &self.inner.dispatcher)
            .finish_non_exhaustive()
    }
}

impl ReflexianClient {
    /// Client over `reqwest`, dispatching onto the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ReflexianError::Validation` if called outside a tokio
    /// runtime or if the API key is empty, and `ReflexianError::Transport`
    /// if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ReflexianError> {
        if config.api_key.is_empty() {
            return Err(ReflexianError::validation("API key must not be empty"));
        }
        let dispatcher = Dispatcher::try_current()
            .map_err(|e| ReflexianError::validation(format!("no tokio runtime: {e}")))?;
        let transport = ReqwestTransport::new(config.clone())?;
        Ok(Self::with_transport(config, Arc::new(transport), dispatcher))
    }

    /// Client over a caller-supplied transport and dispatcher.
    #[must_use]
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                dispatcher,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Look up a player by UUID, dashed or undashed.
    pub fn lookup_player(&self, uuid: &str) -> PendingCall<PlayerReply> {
        self.lookup(translate::PLAYER, uuid)
    }

    /// Look up a license key. The key must be in dashed form.
    pub fn lookup_key(&self, key: &str) -> PendingCall<KeyReply> {
        self.lookup(translate::KEY, key)
    }

    /// Look up a license by UUID.
    pub fn lookup_license(&self, uuid: &str) -> PendingCall<LicenseReply> {
        self.lookup(translate::LICENSE, uuid)
    }

    /// Create a license from a raw JSON body.
    ///
    /// Resolves to the server's reply in canonical JSON form.
    pub fn create_license(&self, json: impl Into<String>) -> PendingCall<String> {
        match translate::build_create_request(&self.inner.config.api_key, json.into()) {
            Ok(request) => self.dispatch(request, |raw| translate::decode_created(&raw)),
            Err(err) => PendingCall::failed(err),
        }
    }

    /// Create a license from a typed payload.
    pub fn create_license_from(&self, license: &NewLicense) -> PendingCall<String> {
        match license.to_json() {
            Ok(json) => self.create_license(json),
            Err(err) => PendingCall::failed(err),
        }
    }

    fn lookup<R: Reply>(&self, lookup: Lookup<R>, parameter: &str) -> PendingCall<R> {
        match lookup.build_request(&self.inner.config.api_key, parameter) {
            Ok(request) => self.dispatch(request, move |raw| classify((lookup.decode)(&raw)?)),
            Err(err) => {
                debug!(operation = lookup.operation.name(), error = %err, "request rejected before dispatch");
                PendingCall::failed(err)
            }
        }
    }

    /// Execute `request` on the dispatcher and interpret the body with
    /// `interpret`. A missing body never reaches `interpret`.
    fn dispatch<T, F>(&self, request: WireRequest, interpret: F) -> PendingCall<T>
    where
        T: Send + 'static,
        F: FnOnce(bytes::Bytes) -> Outcome<T> + Send + 'static,
    {
        let operation = request.operation;
        let transport = Arc::clone(&self.inner.transport);
        let span = info_span!("reflexian_call", operation = operation.name(), path = %request.path);

        self.inner.dispatcher.submit(
            async move {
                let outcome = match transport.execute(request).await {
                    Ok(Some(raw)) => interpret(raw),
                    Ok(None) => Err(ReflexianError::empty_reply()),
                    Err(err) => Err(ReflexianError::Transport(err)),
                };

                match &outcome {
                    Ok(_) => debug!("call succeeded"),
                    Err(err) if operation == Operation::CreateLicense => {
                        warn!(kind = ?err.kind(), error = %err, "license creation failed");
                    }
                    Err(err) => debug!(kind = ?err.kind(), error = %err, "call failed"),
                }
                outcome
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use http::Method;
    use parking_lot::Mutex;
    use reflexian_core::{FailureKind, API_KEY_HEADER};
    use tokio::sync::Notify;
    use uuid::Uuid;

    use super::*;

    const PLAYER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

    /// Answers from a fixed path -> body table and records every request.
    #[derive(Default)]
    struct StubTransport {
        replies: HashMap<String, Option<&'static str>>,
        calls: Mutex<Vec<WireRequest>>,
    }

    impl StubTransport {
        fn with(mut self, path: &str, body: Option<&'static str>) -> Self {
            self.replies.insert(path.to_string(), body);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn execute(&self, request: WireRequest) -> anyhow::Result<Option<Bytes>> {
            let reply = self.replies.get(&request.path).copied();
            self.calls.lock().push(request.clone());
            match reply {
                Some(body) => Ok(body.map(|b| Bytes::from_static(b.as_bytes()))),
                None => Err(anyhow::anyhow!("connection refused")),
            }
        }
    }

    fn client(transport: &Arc<StubTransport>) -> ReflexianClient {
        ReflexianClient::with_transport(
            ClientConfig::new("test-key"),
            Arc::clone(transport) as Arc<dyn Transport>,
            Dispatcher::try_current().unwrap(),
        )
    }

    fn player_path(id: &str) -> String {
        format!("/api/v1/player/{id}")
    }

    #[tokio::test]
    async fn lookup_player_resolves_to_player_fields() {
        let body = r#"{"success":true,"throttled":false,"blacklisted":false,"licenseKeyError":false,
                       "uuid":"123e4567-e89b-12d3-a456-426614174000","name":"Notch"}"#;
        let stub = Arc::new(StubTransport::default().with(&player_path(PLAYER_ID), Some(body)));

        let reply = client(&stub).lookup_player(PLAYER_ID).await.unwrap();

        assert_eq!(reply.uuid, Some(Uuid::parse_str(PLAYER_ID).unwrap()));
        assert_eq!(reply.name.as_deref(), Some("Notch"));

        let calls = stub.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::GET);
        assert_eq!(calls[0].headers[API_KEY_HEADER], "test-key");
    }

    #[tokio::test]
    async fn empty_parameter_never_reaches_transport() {
        let stub = Arc::new(StubTransport::default());
        let client = client(&stub);

        let player = client.lookup_player("").await.unwrap_err();
        let key = client.lookup_key("").await.unwrap_err();
        let license = client.lookup_license("").await.unwrap_err();

        for err in [player, key, license] {
            assert_eq!(err.kind(), FailureKind::Validation);
        }
        assert_eq!(stub.call_count(), 0);
        assert_eq!(client.dispatcher().in_flight(), 0);
    }

    #[tokio::test]
    async fn throttled_reply_is_classified() {
        let stub = Arc::new(StubTransport::default().with(
            "/api/v1/key/abc",
            Some(r#"{"success":false,"throttled":true,"cause":"slow down"}"#),
        ));
        let err = client(&stub).lookup_key("abc").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Throttled);
    }

    #[tokio::test]
    async fn license_key_error_is_classified() {
        let stub = Arc::new(StubTransport::default().with(
            "/api/v1/key/abc",
            Some(r#"{"success":true,"licenseKeyError":true}"#),
        ));
        let err = client(&stub).lookup_key("abc").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotLicenseKey);
    }

    #[tokio::test]
    async fn error_payload_decodes_then_classifies_as_rejected() {
        let stub = Arc::new(StubTransport::default().with(
            "/api/v1/licenses/abc",
            Some(r#"{"success":false,"cause":"License not found"}"#),
        ));
        let err = client(&stub).lookup_license("abc").await.unwrap_err();
        assert!(matches!(err, ReflexianError::Rejected { ref cause } if cause == "License not found"));
    }

    #[tokio::test]
    async fn missing_body_is_transport_failure() {
        let stub = Arc::new(StubTransport::default().with(&player_path("abc"), None));
        let err = client(&stub).lookup_player("abc").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[tokio::test]
    async fn transport_error_is_transport_failure() {
        let stub = Arc::new(StubTransport::default());
        let err = client(&stub).lookup_player("abc").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_transport_failure() {
        let stub = Arc::new(StubTransport::default().with(&player_path("abc"), Some("<html>")));
        let err = client(&stub).lookup_player("abc").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[tokio::test]
    async fn create_license_failure_carries_cause() {
        let stub = Arc::new(StubTransport::default().with(
            "/api/v1/licenses/",
            Some(r#"{"success":false,"cause":"quota exceeded"}"#),
        ));
        let err = client(&stub)
            .create_license(r#"{"product":"prison"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ReflexianError::Rejected { ref cause } if cause == "quota exceeded"));

        let calls = stub.calls.lock();
        assert_eq!(calls[0].operation, Operation::CreateLicense);
        assert_eq!(calls[0].method, Method::POST);
        assert_eq!(calls[0].body.as_deref(), Some(r#"{"product":"prison"}"#));
    }

    #[tokio::test]
    async fn create_license_success_returns_canonical_json() {
        let stub = Arc::new(StubTransport::default().with(
            "/api/v1/licenses/",
            Some(r#"{ "uuid": "abc", "success": true }"#),
        ));
        let created = client(&stub)
            .create_license_from(&NewLicense::new("prison", Uuid::nil()))
            .await
            .unwrap();
        assert_eq!(created, r#"{"success":true,"uuid":"abc"}"#);
    }

    #[tokio::test]
    async fn invalid_license_payload_never_reaches_transport() {
        let stub = Arc::new(StubTransport::default());
        let err = client(&stub)
            .create_license_from(&NewLicense::new("", Uuid::nil()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
        assert_eq!(stub.call_count(), 0);
    }

    /// Holds the reply for player "A" until released; "B" answers at once.
    struct GatedTransport {
        gate: Notify,
        served: AtomicUsize,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn execute(&self, request: WireRequest) -> anyhow::Result<Option<Bytes>> {
            let id = request.path.rsplit('/').next().unwrap_or_default().to_string();
            if id == "A" {
                self.gate.notified().await;
            }
            self.served.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Bytes::from(format!(r#"{{"success":true,"name":"{id}"}}"#))))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_calls_resolve_independently() {
        let transport = Arc::new(GatedTransport {
            gate: Notify::new(),
            served: AtomicUsize::new(0),
        });
        let client = ReflexianClient::with_transport(
            ClientConfig::new("k"),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Dispatcher::try_current().unwrap(),
        );

        let a = client.lookup_player("A");
        let b = client.lookup_player("B");

        // B resolves while A is still parked inside its worker.
        let b = b.await.unwrap();
        assert_eq!(b.name.as_deref(), Some("B"));
        assert_eq!(transport.served.load(Ordering::SeqCst), 1);

        transport.gate.notify_one();
        let a = a.await.unwrap();
        assert_eq!(a.name.as_deref(), Some("A"));
        assert_eq!(client.dispatcher().in_flight(), 0);
    }

    #[test]
    fn new_requires_api_key_and_runtime() {
        let err = ReflexianClient::new(ClientConfig::default()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);

        let err = ReflexianClient::new(ClientConfig::new("k")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Validation);
    }
}
