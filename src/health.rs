//! Dependency health sweeper.
//!
//! The sweeper pings every registered dependency on an interval, each ping
//! bounded by a timeout, and publishes the result as a snapshot. The HTTP
//! handler only ever reads the last snapshot.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::queue::MessageQueue;
use crate::shutdown::ShutdownSignal;
use crate::storage::ObjectStore;
use crate::store::InstructionStore;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> String;

    async fn check(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DependencyStatus {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub checked_at: Option<DateTime<Utc>>,
    pub dependencies: Vec<DependencyStatus>,
}

impl HealthSnapshot {
    /// Before the first sweep
    pub fn pending() -> Self {
        Self {
            healthy: false,
            checked_at: None,
            dependencies: Vec::new(),
        }
    }
}

/// Read side of the snapshot
#[derive(Clone)]
pub struct HealthHandle {
    snapshot: Arc<RwLock<HealthSnapshot>>,
}

impl HealthHandle {
    pub async fn snapshot(&self) -> HealthSnapshot {
        self.snapshot.read().await.clone()
    }
}

pub struct HealthSweeper {
    checks: Vec<Arc<dyn HealthCheck>>,
    interval: Duration,
    ping_timeout: Duration,
    snapshot: Arc<RwLock<HealthSnapshot>>,
}

impl HealthSweeper {
    pub fn new(interval: Duration, ping_timeout: Duration) -> Self {
        Self {
            checks: Vec::new(),
            interval,
            ping_timeout,
            snapshot: Arc::new(RwLock::new(HealthSnapshot::pending())),
        }
    }

    pub fn register(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn handle(&self) -> HealthHandle {
        HealthHandle {
            snapshot: self.snapshot.clone(),
        }
    }

    /// Ping everything once and publish the result
    pub async fn sweep(&self) -> HealthSnapshot {
        let dependencies = join_all(self.checks.iter().map(|check| async move {
            let name = check.name();
            let error = match tokio::time::timeout(self.ping_timeout, check.check()).await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(_) => Some(format!("timed out after {:?}", self.ping_timeout)),
            };
            if let Some(e) = &error {
                warn!(dependency = %name, error = %e, "Health check failed");
            }
            DependencyStatus {
                name,
                healthy: error.is_none(),
                error,
            }
        }))
        .await;

        let snapshot = HealthSnapshot {
            healthy: dependencies.iter().all(|d| d.healthy),
            checked_at: Some(Utc::now()),
            dependencies,
        };
        *self.snapshot.write().await = snapshot.clone();
        snapshot
    }

    pub async fn run(&self, shutdown: ShutdownSignal) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            checks = self.checks.len(),
            "Health sweeper started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
        info!("Health sweeper stopped");
    }
}

// Adapters for the service's dependencies

pub struct StoreHealth(pub Arc<dyn InstructionStore>);

#[async_trait]
impl HealthCheck for StoreHealth {
    fn name(&self) -> String {
        "instruction_store".to_string()
    }

    async fn check(&self) -> Result<(), String> {
        self.0.ping().await.map_err(|e| e.to_string())
    }
}

pub struct QueueHealth(pub Arc<dyn MessageQueue>);

#[async_trait]
impl HealthCheck for QueueHealth {
    fn name(&self) -> String {
        format!("queue:{}", self.0.name())
    }

    async fn check(&self) -> Result<(), String> {
        self.0.ping().await.map_err(|e| e.to_string())
    }
}

pub struct ObjectStoreHealth(pub Arc<dyn ObjectStore>);

#[async_trait]
impl HealthCheck for ObjectStoreHealth {
    fn name(&self) -> String {
        "object_store".to_string()
    }

    async fn check(&self) -> Result<(), String> {
        self.0.ping().await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::InMemoryQueue;
    use crate::store::InMemoryInstructionStore;

    struct Failing;

    #[async_trait]
    impl HealthCheck for Failing {
        fn name(&self) -> String {
            "failing".to_string()
        }

        async fn check(&self) -> Result<(), String> {
            Err("connection refused".to_string())
        }
    }

    struct Hanging;

    #[async_trait]
    impl HealthCheck for Hanging {
        fn name(&self) -> String {
            "hanging".to_string()
        }

        async fn check(&self) -> Result<(), String> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        }
    }

    fn sweeper() -> HealthSweeper {
        HealthSweeper::new(Duration::from_millis(20), Duration::from_millis(50))
            .register(Arc::new(StoreHealth(Arc::new(InMemoryInstructionStore::new()))))
            .register(Arc::new(QueueHealth(Arc::new(InMemoryQueue::new("notifications")))))
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_unhealthy() {
        let sweeper = sweeper();
        let snapshot = sweeper.handle().snapshot().await;
        assert!(!snapshot.healthy);
        assert!(snapshot.checked_at.is_none());
    }

    #[tokio::test]
    async fn test_sweep_publishes_snapshot() {
        let sweeper = sweeper();
        let handle = sweeper.handle();
        assert!(sweeper.sweep().await.healthy);

        let snapshot = handle.snapshot().await;
        assert!(snapshot.healthy);
        assert_eq!(snapshot.dependencies.len(), 2);
        assert_eq!(snapshot.dependencies[1].name, "queue:notifications");
    }

    #[tokio::test]
    async fn test_failing_and_slow_dependencies_mark_unhealthy() {
        let sweeper = sweeper()
            .register(Arc::new(Failing))
            .register(Arc::new(Hanging));
        let snapshot = sweeper.sweep().await;
        assert!(!snapshot.healthy);
        let failed: Vec<&str> = snapshot
            .dependencies
            .iter()
            .filter(|d| !d.healthy)
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(failed, vec!["failing", "hanging"]);
    }

    #[tokio::test]
    async fn test_run_sweeps_until_shutdown() {
        let sweeper = Arc::new(sweeper());
        let handle = sweeper.handle();
        let shutdown = ShutdownSignal::new();
        let task = {
            let sweeper = sweeper.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { sweeper.run(shutdown).await })
        };

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(handle.snapshot().await.healthy);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
