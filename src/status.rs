use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::sync::watch;
use tracing::error;

use crate::error::{ClientError, Result};

/// How long a success indicator stays up before clearing itself.
pub const SUCCESS_BANNER_TTL: Duration = Duration::from_secs(3);

/// Inline status of one kind of mutation (upload, reorder, form submit, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
}

impl OpStatus {
    pub fn pending() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Publishes an [`OpStatus`] and clears `success` after a delay.
///
/// A clear only applies if no newer operation started in the meantime.
pub struct StatusTracker {
    status: Arc<watch::Sender<OpStatus>>,
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::with_ttl(SUCCESS_BANNER_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let (status, _) = watch::channel(OpStatus::default());
        Self {
            status: Arc::new(status),
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    pub fn current(&self) -> OpStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OpStatus> {
        self.status.subscribe()
    }

    pub fn begin(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.status.send_replace(OpStatus::pending());
    }

    pub fn succeed(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.status.send_replace(OpStatus::succeeded());

        let status = Arc::downgrade(&self.status);
        let current = Arc::clone(&self.generation);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let Some(status) = status.upgrade() else {
                return;
            };
            if current.load(Ordering::SeqCst) == generation {
                status.send_modify(|op| op.success = false);
            }
        });
    }

    pub fn fail(&self, err: &ClientError) {
        self.status.send_replace(OpStatus::failed(err.message()));
    }

    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.status.send_replace(OpStatus::default());
    }

    /// Run `operation`, reflecting its progress and outcome in the status.
    pub async fn track<T, F>(&self, label: &str, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.begin();
        match operation.await {
            Ok(value) => {
                self.succeed();
                Ok(value)
            }
            Err(err) => {
                error!(?err, operation = label, "mutation failed");
                self.fail(&err);
                Err(err)
            }
        }
    }
}
