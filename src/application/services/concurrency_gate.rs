use std::fmt;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub const DEFAULT_METADATA_SLOTS: usize = 2;
pub const DEFAULT_CONVERSION_SLOTS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// Short lookups that only ask the tool for information.
    Metadata,
    /// Full download + transcode runs.
    Conversion,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Metadata => "metadata",
            ResourceClass::Conversion => "conversion",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two independent counting gates, one per resource class. Waiting on one class
/// never blocks callers of the other.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    metadata: Arc<Semaphore>,
    conversion: Arc<Semaphore>,
    metadata_slots: usize,
    conversion_slots: usize,
}

impl ConcurrencyGate {
    pub fn new(metadata_slots: usize, conversion_slots: usize) -> Self {
        Self {
            metadata: Arc::new(Semaphore::new(metadata_slots)),
            conversion: Arc::new(Semaphore::new(conversion_slots)),
            metadata_slots,
            conversion_slots,
        }
    }

    /// Suspends until a slot of `class` is free. The slot returns when the permit drops.
    pub async fn acquire(&self, class: ResourceClass) -> Result<GatePermit, GateClosed> {
        let permit = Arc::clone(self.semaphore(class))
            .acquire_owned()
            .await
            .map_err(|_| GateClosed(class))?;
        tracing::debug!(class = %class, in_use = self.in_use(class), "Gate slot acquired");
        Ok(GatePermit {
            class,
            _permit: permit,
        })
    }

    pub fn capacity(&self, class: ResourceClass) -> usize {
        match class {
            ResourceClass::Metadata => self.metadata_slots,
            ResourceClass::Conversion => self.conversion_slots,
        }
    }

    pub fn in_use(&self, class: ResourceClass) -> usize {
        self.capacity(class) - self.semaphore(class).available_permits()
    }

    fn semaphore(&self, class: ResourceClass) -> &Arc<Semaphore> {
        match class {
            ResourceClass::Metadata => &self.metadata,
            ResourceClass::Conversion => &self.conversion,
        }
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_SLOTS, DEFAULT_CONVERSION_SLOTS)
    }
}

/// Holds one slot of a resource class until dropped.
#[derive(Debug)]
pub struct GatePermit {
    class: ResourceClass,
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    pub fn class(&self) -> ResourceClass {
        self.class
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0} gate is closed")]
pub struct GateClosed(pub ResourceClass);
