//! Analytics server lifecycle: bind, spawn the axum task, hand back a
//! handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::analytics_router;
use crate::store::RowStore;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind analytics server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Failed to get server address: {0}")]
    LocalAddr(std::io::Error),
}

/// Handle to a running analytics server.
pub struct AnalyticsServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl AnalyticsServer {
    /// Binds `addr` (port 0 picks an ephemeral port) and starts serving
    /// the analytics router in a background task.
    pub async fn start(addr: SocketAddr, store: Arc<dyn RowStore>) -> Result<Self, ServerError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        let app = analytics_router(store);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let shutdown_signal = async move {
                let _ = shutdown_rx.await;
                tracing::info!("Analytics server received shutdown signal");
            };

            tracing::info!(%addr, "Analytics server started");

            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal)
                .await
            {
                tracing::error!("Analytics server error: {e}");
            }

            tracing::info!("Analytics server stopped");
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signals graceful shutdown. Calling it again is a no-op.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Analytics server shutdown signal sent");
        }
    }

    /// Waits for the server task to finish draining.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::error!("Analytics server task failed: {e}");
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn start_serve_and_stop() {
        let store = MemoryStore::new().with_rows(
            "appointments",
            vec![
                json!({"id": 1, "scheduled_at": "2024-03-01T09:00:00Z", "status": "completed"}),
                json!({"id": 2, "scheduled_at": "2024-03-02T09:00:00Z", "status": "cancelled"}),
            ],
        );
        let mut server = AnalyticsServer::start(loopback(), Arc::new(store))
            .await
            .expect("server should start");
        assert!(server.addr().port() > 0);

        let url = format!(
            "http://{}/api/reports?reportType=appointment-stats&start=2024-03-01&end=2024-03-31",
            server.addr()
        );
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"data": {"cancelled": 1, "completed": 1}}));

        server.shutdown();
        server.wait().await;
    }

    #[tokio::test]
    async fn shutdown_twice_is_safe() {
        let mut server = AnalyticsServer::start(loopback(), Arc::new(MemoryStore::new()))
            .await
            .expect("server should start");
        server.shutdown();
        server.shutdown();
        server.wait().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let server = AnalyticsServer::start(loopback(), Arc::new(MemoryStore::new()))
            .await
            .expect("server should start");
        let taken = server.addr();

        let err = AnalyticsServer::start(taken, Arc::new(MemoryStore::new()))
            .await
            .err()
            .expect("second bind should fail");
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
