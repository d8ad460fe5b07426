//! Resource catalog entries and read-only occupancy accounting.
//!
//! Occupancy is always derived from the allocation store; nothing here is
//! cached or mutated, which keeps every capacity decision anchored to the
//! same durable count.

use serde::{Deserialize, Serialize};

use crate::core::error::AdmissionError;
use crate::core::ledger::AllocationStore;
use crate::util::serde::ResourceId;

/// A capacity-bounded resource (a course).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier.
    pub id: ResourceId,
    /// Maximum number of allocations. Always positive.
    pub capacity: u32,
    /// Optional deadline (ms since epoch) after which no new requests are
    /// accepted.
    pub deadline_ms: Option<u128>,
}

impl Resource {
    /// Create a resource with a fresh identifier.
    pub fn new(capacity: u32, deadline_ms: Option<u128>) -> Self {
        Self {
            id: ResourceId::new(),
            capacity,
            deadline_ms,
        }
    }

    /// Whether submissions are still open at `now_ms`.
    pub fn is_open(&self, now_ms: u128) -> bool {
        self.deadline_ms.map_or(true, |d| now_ms <= d)
    }

    /// Whether `allocated` consumes the full capacity.
    pub fn is_full(&self, allocated: usize) -> bool {
        allocated >= self.capacity as usize
    }

    /// Seats remaining given `allocated`. Clamped at zero so a capacity
    /// reduction below the current occupancy never underflows.
    pub fn available(&self, allocated: usize) -> u32 {
        (self.capacity as usize).saturating_sub(allocated) as u32
    }
}

/// Serializable occupancy snapshot for a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSummary {
    /// Resource identifier.
    pub id: ResourceId,
    /// Configured capacity.
    pub capacity: u32,
    /// Confirmed allocations.
    pub allocated: u32,
    /// Seats remaining (never negative).
    pub available: u32,
    /// Whether the resource is at or above capacity.
    pub is_full: bool,
}

impl ResourceSummary {
    /// Derive a summary from the resource and its allocation store.
    pub fn snapshot<A>(resource: &Resource, allocations: &A) -> Result<Self, AdmissionError>
    where
        A: AllocationStore + ?Sized,
    {
        let allocated = allocations.count_for(resource.id)?;
        Ok(Self {
            id: resource.id,
            capacity: resource.capacity,
            allocated: allocated as u32,
            available: resource.available(allocated),
            is_full: resource.is_full(allocated),
        })
    }
}
