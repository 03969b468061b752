use std::sync::atomic::{AtomicBool, Ordering};

pub trait FeatureFlags: Send + Sync {
    /// File listener processes notifications only while this is on
    fn ingestion_enabled(&self) -> bool;
}

/// Flags seeded from configuration; switchable at runtime
#[derive(Debug)]
pub struct StaticFeatureFlags {
    ingestion: AtomicBool,
}

impl StaticFeatureFlags {
    pub fn new(ingestion_enabled: bool) -> Self {
        Self {
            ingestion: AtomicBool::new(ingestion_enabled),
        }
    }

    pub fn set_ingestion(&self, enabled: bool) {
        self.ingestion.store(enabled, Ordering::Relaxed);
    }
}

impl FeatureFlags for StaticFeatureFlags {
    fn ingestion_enabled(&self) -> bool {
        self.ingestion.load(Ordering::Relaxed)
    }
}
