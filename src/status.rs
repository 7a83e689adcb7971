//! Background system-status polling.
//!
//! Runs independently of the workflow on a fixed interval. Fetch failures
//! collapse into an offline/unknown display value and never surface as
//! workflow errors.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{BackendClient, GpuMemory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Unknown => write!(f, "sconosciuto"),
            Availability::Online => write!(f, "online"),
            Availability::Offline => write!(f, "offline"),
        }
    }
}

/// Display-only view of the backend's health.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub backend: Availability,
    pub ollama: Availability,
    pub whisper_loaded: bool,
    pub cuda_available: bool,
    pub device: Option<String>,
    pub gpu_memory: Option<String>,
    pub current_model: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Fetch both status endpoints once, swallowing failures into the
/// snapshot's availability fields.
pub async fn fetch_snapshot(client: &BackendClient) -> StatusSnapshot {
    let (memory, ollama) = tokio::join!(client.memory_stats(), client.ollama_status());

    let mut snapshot = StatusSnapshot {
        last_updated: Some(Utc::now()),
        ..Default::default()
    };

    match memory {
        Ok(stats) => {
            snapshot.backend = Availability::Online;
            snapshot.whisper_loaded = stats.models.whisper_loaded;
            snapshot.cuda_available = stats.models.cuda_available;
            snapshot.device = Some(stats.models.device);
            snapshot.gpu_memory = Some(match stats.memory.gpu {
                GpuMemory::Usage { free, total } => {
                    format!("{:.2}GB liberi / {:.2}GB totali", free, total)
                }
                GpuMemory::Text(text) => text,
            });
        }
        Err(e) => {
            debug!("Memory stats unavailable: {}", e);
            snapshot.backend = Availability::Offline;
        }
    }

    match ollama {
        Ok(status) => {
            snapshot.ollama = if status.status == "online" {
                Availability::Online
            } else {
                Availability::Offline
            };
            snapshot.current_model = status.current_model.map(|m| m.name);
        }
        Err(e) => {
            debug!("Ollama status unavailable: {}", e);
            snapshot.ollama = Availability::Offline;
        }
    }

    snapshot
}

/// Polls system status on a fixed interval for as long as it lives.
pub struct SystemStatusPoller {
    snapshot: Arc<RwLock<StatusSnapshot>>,
    handle: Option<JoinHandle<()>>,
}

impl SystemStatusPoller {
    /// Start polling immediately, then on every interval tick.
    pub fn start(client: BackendClient, interval: Duration) -> Self {
        let snapshot = Arc::new(RwLock::new(StatusSnapshot::default()));

        let shared = Arc::clone(&snapshot);
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            loop {
                tick.tick().await;
                let fresh = fetch_snapshot(&client).await;
                *shared.write().await = fresh;
            }
        });

        Self {
            snapshot,
            handle: Some(handle),
        }
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.read().await.clone()
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for SystemStatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
