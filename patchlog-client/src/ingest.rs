//! Ingestion Gate
//!
//! Credential check followed by a single batch forward to the record store.
//!
//! ```text
//! Idle -> AwaitingCredential -> authorize ok  -> AwaitingPayload -> Submitting -> Ingested | Failed
//!                            -> authorize err -> Idle
//! ```
//!
//! A rejected credential always lands back in `Idle`. `Ingested` and `Failed`
//! are terminal for the credential: the next batch needs a fresh `authorize`.
//! The store applies a batch all-or-nothing, so abandoning an in-flight
//! `ingest` never leaves a partial batch behind.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use patchlog_common::api::{ImportResponse, SharedSecret, SECRET_HEADER};
use patchlog_common::model::validate_batch;
use patchlog_common::NewUpdateRecord;
use serde_json::error::Category;
use thiserror::Error;
use tracing::{info, warn};

use crate::http::{build_http_client, join_url, read_error};

/// Write-path failures
#[derive(Debug, Error)]
pub enum IngestionError {
    /// `ingest` called without a successful `authorize` first
    #[error("Not authorized: enter the ingest credential first")]
    NotAuthorized,

    /// Payload is not valid JSON
    #[error("Could not decode payload: {0}")]
    Decode(String),

    /// Payload is JSON but not a valid batch of update records
    #[error("Payload shape mismatch: {0}")]
    Shape(String),

    /// Payload file could not be read
    #[error("Could not read payload: {0}")]
    Io(#[from] std::io::Error),

    /// Request never produced a response
    #[error("Network error: {0}")]
    Transport(String),

    /// Store refused the batch; nothing was applied
    #[error("Store rejected batch ({status} {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },
}

/// Credential did not match. Says nothing about how close the attempt was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Incorrect credential")]
pub struct Unauthorized;

/// Proof of a successful `authorize`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorized {
    _private: (),
}

/// Where the gate is in its flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Idle,
    AwaitingCredential,
    AwaitingPayload,
    /// Batch forwarded, response outstanding
    Submitting,
    Ingested { inserted: usize },
    Failed { reason: String },
}

/// A decoded, validated ingestion batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPayload {
    records: Vec<NewUpdateRecord>,
}

impl ParsedPayload {
    /// Decode a JSON array of update records
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IngestionError> {
        let records: Vec<NewUpdateRecord> =
            serde_json::from_slice(bytes).map_err(|e| match e.classify() {
                Category::Data => IngestionError::Shape(e.to_string()),
                Category::Io | Category::Syntax | Category::Eof => {
                    IngestionError::Decode(e.to_string())
                }
            })?;
        Self::from_records(records)
    }

    /// Read and decode a JSON file
    pub fn from_file(path: &Path) -> Result<Self, IngestionError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Validate already-built records
    pub fn from_records(records: Vec<NewUpdateRecord>) -> Result<Self, IngestionError> {
        if records.is_empty() {
            return Err(IngestionError::Shape("payload contains no records".to_string()));
        }
        validate_batch(&records).map_err(|e| IngestionError::Shape(e.to_string()))?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[NewUpdateRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The record store's bulk-insert operation
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn insert_batch(
        &self,
        records: &[NewUpdateRecord],
        credential: &str,
    ) -> Result<ImportResponse, IngestionError>;
}

/// HTTP client for `POST /api/updates/import`
#[derive(Debug, Clone)]
pub struct HttpRecordSink {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpRecordSink {
    pub fn new(store_url: &str, timeout: Duration) -> Result<Self, IngestionError> {
        let http_client =
            build_http_client(timeout).map_err(|e| IngestionError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: join_url(store_url, "/api/updates/import"),
        })
    }
}

#[async_trait]
impl RecordSink for HttpRecordSink {
    async fn insert_batch(
        &self,
        records: &[NewUpdateRecord],
        credential: &str,
    ) -> Result<ImportResponse, IngestionError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header(SECRET_HEADER, credential)
            .json(records)
            .send()
            .await
            .map_err(|e| IngestionError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let (code, message) = read_error(response).await;
            return Err(IngestionError::Rejected {
                status: status.as_u16(),
                code,
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IngestionError::Transport(e.to_string()))?;
        serde_json::from_slice(&body)
            .map_err(|e| IngestionError::Transport(format!("Unexpected import response: {}", e)))
    }
}

/// Credential gate in front of a [`RecordSink`]
pub struct IngestionGate<S> {
    secret: SharedSecret,
    sink: S,
    state: GateState,
    credential: Option<String>,
}

impl<S: RecordSink> IngestionGate<S> {
    pub fn new(secret: SharedSecret, sink: S) -> Self {
        Self {
            secret,
            sink,
            state: GateState::Idle,
            credential: None,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Start a new ingestion (the operator opened the upload dialog)
    pub fn open(&mut self) {
        self.credential = None;
        self.state = GateState::AwaitingCredential;
    }

    /// Abandon the flow from any state
    pub fn cancel(&mut self) {
        self.credential = None;
        self.state = GateState::Idle;
    }

    /// Check `credential` against the shared secret
    ///
    /// Exact match only. No lockout: a rejected attempt can be followed
    /// immediately by another.
    pub fn authorize(&mut self, credential: &str) -> Result<Authorized, Unauthorized> {
        if self.secret.verify(credential) {
            self.credential = Some(credential.to_string());
            self.state = GateState::AwaitingPayload;
            info!("Ingest credential accepted");
            Ok(Authorized { _private: () })
        } else {
            self.credential = None;
            self.state = GateState::Idle;
            warn!("Ingest credential rejected");
            Err(Unauthorized)
        }
    }

    /// Forward `payload` to the store as one batch
    ///
    /// Requires `AwaitingPayload`; otherwise fails with
    /// [`IngestionError::NotAuthorized`] without contacting the store.
    pub async fn ingest(
        &mut self,
        payload: ParsedPayload,
    ) -> Result<ImportResponse, IngestionError> {
        let credential = match (&self.state, self.credential.take()) {
            (GateState::AwaitingPayload, Some(credential)) => credential,
            _ => return Err(IngestionError::NotAuthorized),
        };

        self.state = GateState::Submitting;

        match self.sink.insert_batch(payload.records(), &credential).await {
            Ok(response) => {
                info!(inserted = response.inserted, "Ingested update batch");
                self.state = GateState::Ingested {
                    inserted: response.inserted,
                };
                Ok(response)
            }
            Err(e) => {
                warn!("Ingestion failed: {}", e);
                self.state = GateState::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Decode `bytes` and ingest them
    ///
    /// A decode or shape failure moves an authorized gate to `Failed`.
    pub async fn ingest_bytes(&mut self, bytes: &[u8]) -> Result<ImportResponse, IngestionError> {
        if self.state != GateState::AwaitingPayload || self.credential.is_none() {
            return Err(IngestionError::NotAuthorized);
        }

        match ParsedPayload::from_slice(bytes) {
            Ok(payload) => self.ingest(payload).await,
            Err(e) => {
                warn!("Rejected payload: {}", e);
                self.credential = None;
                self.state = GateState::Failed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const SECRET: &str = "PiKaChu";

    /// Records every call; optionally fails
    #[derive(Clone, Default)]
    struct FakeSink {
        calls: Arc<AtomicUsize>,
        seen_credentials: Arc<Mutex<Vec<String>>>,
        reject: bool,
    }

    #[async_trait]
    impl RecordSink for FakeSink {
        async fn insert_batch(
            &self,
            records: &[NewUpdateRecord],
            credential: &str,
        ) -> Result<ImportResponse, IngestionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_credentials
                .lock()
                .unwrap()
                .push(credential.to_string());
            if self.reject {
                return Err(IngestionError::Rejected {
                    status: 409,
                    code: "CONFLICT".to_string(),
                    message: "versionName 2.5.0 already exists".to_string(),
                });
            }
            Ok(ImportResponse {
                inserted: records.len(),
                ids: (1..=records.len() as i64).collect(),
            })
        }
    }

    fn gate(sink: FakeSink) -> IngestionGate<FakeSink> {
        IngestionGate::new(SharedSecret::new(SECRET).unwrap(), sink)
    }

    fn payload() -> ParsedPayload {
        ParsedPayload::from_slice(
            br#"[
                {"versionName": "2.5.0", "releaseDate": "Mar 2024", "year": "2024",
                 "majorFeatures": ["Erangel 2.0"]},
                {"versionName": "2.3.0", "releaseDate": "Nov 2023", "year": "2023",
                 "majorFeatures": ["Livik 2.0"], "mapChanges": []}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_authorize_exact_secret() {
        let mut gate = gate(FakeSink::default());
        gate.open();
        assert_eq!(gate.state(), &GateState::AwaitingCredential);

        assert!(gate.authorize(SECRET).is_ok());
        assert_eq!(gate.state(), &GateState::AwaitingPayload);
    }

    #[test]
    fn test_authorize_rejects_variants_and_resets_to_idle() {
        let mut gate = gate(FakeSink::default());
        for wrong in ["", "wrong", "pikachu", "PIKACHU", " PiKaChu", "PiKaChu ", "\tPiKaChu\n"] {
            gate.open();
            assert_eq!(gate.authorize(wrong), Err(Unauthorized), "credential {:?}", wrong);
            assert_eq!(gate.state(), &GateState::Idle);
        }
    }

    #[test]
    fn test_wrong_then_right_no_lockout() {
        let mut gate = gate(FakeSink::default());
        assert_eq!(gate.authorize("wrong"), Err(Unauthorized));
        assert!(gate.authorize(SECRET).is_ok());
    }

    #[test]
    fn test_unauthorized_error_reveals_nothing() {
        assert_eq!(Unauthorized.to_string(), "Incorrect credential");
    }

    #[tokio::test]
    async fn test_ingest_after_authorize_forwards_batch() {
        let sink = FakeSink::default();
        let mut gate = gate(sink.clone());
        gate.open();
        gate.authorize(SECRET).unwrap();

        let response = gate.ingest(payload()).await.unwrap();

        assert_eq!(response.inserted, 2);
        assert_eq!(gate.state(), &GateState::Ingested { inserted: 2 });
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*sink.seen_credentials.lock().unwrap(), vec![SECRET.to_string()]);
    }

    #[tokio::test]
    async fn test_ingest_without_authorize_never_calls_store() {
        let sink = FakeSink::default();
        let mut gate = gate(sink.clone());

        let result = gate.ingest(payload()).await;
        assert!(matches!(result, Err(IngestionError::NotAuthorized)));

        gate.open();
        let _ = gate.authorize("wrong");
        let result = gate.ingest(payload()).await;
        assert!(matches!(result, Err(IngestionError::NotAuthorized)));

        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_ingest_needs_new_credential() {
        let sink = FakeSink::default();
        let mut gate = gate(sink.clone());
        gate.authorize(SECRET).unwrap();
        gate.ingest(payload()).await.unwrap();

        let result = gate.ingest(payload()).await;
        assert!(matches!(result, Err(IngestionError::NotAuthorized)));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_rejection_moves_to_failed() {
        let sink = FakeSink {
            reject: true,
            ..FakeSink::default()
        };
        let mut gate = gate(sink);
        gate.authorize(SECRET).unwrap();

        let result = gate.ingest(payload()).await;
        assert!(matches!(result, Err(IngestionError::Rejected { status: 409, .. })));
        assert!(matches!(gate.state(), GateState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_cancel_after_authorize_returns_to_idle() {
        let sink = FakeSink::default();
        let mut gate = gate(sink.clone());
        gate.authorize(SECRET).unwrap();
        gate.cancel();

        assert_eq!(gate.state(), &GateState::Idle);
        assert!(matches!(
            gate.ingest(payload()).await,
            Err(IngestionError::NotAuthorized)
        ));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ingest_bytes_decode_failure_moves_to_failed() {
        let sink = FakeSink::default();
        let mut gate = gate(sink.clone());
        gate.authorize(SECRET).unwrap();

        let result = gate.ingest_bytes(b"{ not json").await;
        assert!(matches!(result, Err(IngestionError::Decode(_))));
        assert!(matches!(gate.state(), GateState::Failed { .. }));
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ingest_bytes_requires_authorization() {
        let mut gate = gate(FakeSink::default());
        let result = gate.ingest_bytes(b"[]").await;
        assert!(matches!(result, Err(IngestionError::NotAuthorized)));
        assert_eq!(gate.state(), &GateState::Idle);
    }

    #[test]
    fn test_payload_decode_vs_shape_errors() {
        assert!(matches!(
            ParsedPayload::from_slice(b"[{"),
            Err(IngestionError::Decode(_))
        ));
        assert!(matches!(
            ParsedPayload::from_slice(br#"{"versionName": "2.5.0"}"#),
            Err(IngestionError::Shape(_))
        ));
        assert!(matches!(
            ParsedPayload::from_slice(br#"[{"versionName": "2.5.0"}]"#),
            Err(IngestionError::Shape(_))
        ));
        assert!(matches!(
            ParsedPayload::from_slice(b"[]"),
            Err(IngestionError::Shape(_))
        ));
    }

    #[test]
    fn test_payload_rejects_duplicate_versions_and_bad_years() {
        let duplicate = br#"[
            {"versionName": "2.5.0", "releaseDate": "Mar 2024", "year": "2024", "majorFeatures": []},
            {"versionName": "2.5.0", "releaseDate": "Mar 2024", "year": "2024", "majorFeatures": []}
        ]"#;
        assert!(matches!(
            ParsedPayload::from_slice(duplicate),
            Err(IngestionError::Shape(_))
        ));

        let bad_year = br#"[
            {"versionName": "2.5.0", "releaseDate": "Mar 2024", "year": "24", "majorFeatures": []}
        ]"#;
        assert!(matches!(
            ParsedPayload::from_slice(bad_year),
            Err(IngestionError::Shape(_))
        ));
    }

    #[test]
    fn test_payload_preserves_optional_lists() {
        let parsed = payload();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.records()[0].map_changes, None);
        assert_eq!(parsed.records()[1].map_changes, Some(vec![]));
    }

    #[test]
    fn test_payload_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("updates.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "versionName": "2.5.0", "releaseDate": "Mar 2024", "year": "2024", "majorFeatures": []}]"#,
        )
        .unwrap();

        let parsed = ParsedPayload::from_file(&path).unwrap();
        assert_eq!(parsed.records()[0].version_name, "2.5.0");

        let missing = ParsedPayload::from_file(&temp_dir.path().join("nope.json"));
        assert!(matches!(missing, Err(IngestionError::Io(_))));
    }
}
