//! Record store running in-process for client integration tests
//!
//! Binds the real store router on an ephemeral port, backed by an in-memory
//! database, so the client talks to it over real HTTP.

use std::net::SocketAddr;
use std::time::Duration;

use patchlog_common::api::SharedSecret;
use patchlog_store::{build_router, db, AppState};
use tokio::task::JoinHandle;

pub const SECRET: &str = "PiKaChu";
pub const TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestStore {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestStore {
    /// Start an empty store
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        let pool = db::init_memory_database().await?;
        let state = AppState::new(pool, SharedSecret::new(SECRET)?);
        let app = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self { addr, handle })
    }

    /// Base URL for `QueryService::new` / `HttpRecordSink::new`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestStore {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
