//! In-memory stores with store-level uniqueness enforcement.
//!
//! Both stores keep a (requester, resource) pair index alongside the record
//! map so the uniqueness invariants are constraints of the insert itself,
//! mirroring what the Postgres backend expresses as unique indexes. A
//! check-then-insert in the caller is never relied on.

use std::collections::HashMap;

use crate::core::error::AdmissionError;
use crate::core::ledger::{
    promotion_order, Allocation, AllocationStore, Request, RequestLedger, RequestStatus,
};
use crate::util::serde::{AllocationId, RequestId, RequesterId, ResourceId};

/// In-memory request ledger for development and testing.
pub struct InMemoryLedger {
    requests: HashMap<RequestId, Request>,
    /// Active (non-terminal) request per pair. Rows leave this index when
    /// they reach a terminal state; history stays in `requests` forever.
    active: HashMap<(RequesterId, ResourceId), RequestId>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            active: HashMap::new(),
        }
    }

    /// Number of requests retained, terminal rows included.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether the ledger holds no requests at all.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLedger for InMemoryLedger {
    fn insert(&mut self, request: Request) -> Result<(), AdmissionError> {
        if request.status.is_terminal() {
            return Err(AdmissionError::Backend(
                "cannot insert a request in a terminal state".into(),
            ));
        }
        let pair = (request.requester, request.resource);
        if self.active.contains_key(&pair) {
            return Err(AdmissionError::DuplicateActiveRequest);
        }
        self.active.insert(pair, request.id);
        self.requests.insert(request.id, request);
        Ok(())
    }

    fn get(&self, id: RequestId) -> Result<Option<Request>, AdmissionError> {
        Ok(self.requests.get(&id).cloned())
    }

    fn update(&mut self, request: &Request) -> Result<(), AdmissionError> {
        if !self.requests.contains_key(&request.id) {
            return Err(AdmissionError::NotFound(format!("request {}", request.id)));
        }
        if request.status.is_terminal() {
            self.active.remove(&(request.requester, request.resource));
        }
        self.requests.insert(request.id, request.clone());
        Ok(())
    }

    fn next_waitlisted(&self, resource: ResourceId) -> Result<Option<Request>, AdmissionError> {
        Ok(self
            .requests
            .values()
            .filter(|r| r.resource == resource && r.status == RequestStatus::Waitlisted)
            .min_by(|a, b| promotion_order(a, b))
            .cloned())
    }

    fn waitlisted_count(&self, resource: ResourceId) -> Result<usize, AdmissionError> {
        Ok(self
            .requests
            .values()
            .filter(|r| r.resource == resource && r.status == RequestStatus::Waitlisted)
            .count())
    }

    fn pending_count(&self, resource: ResourceId) -> Result<usize, AdmissionError> {
        Ok(self
            .requests
            .values()
            .filter(|r| r.resource == resource && r.status == RequestStatus::Pending)
            .count())
    }

    fn active_for_resource(&self, resource: ResourceId) -> Result<Vec<Request>, AdmissionError> {
        let mut active: Vec<Request> = self
            .requests
            .values()
            .filter(|r| r.resource == resource && !r.status.is_terminal())
            .cloned()
            .collect();
        active.sort_by(promotion_order);
        Ok(active)
    }
}

/// In-memory allocation store for development and testing.
pub struct InMemoryAllocations {
    allocations: HashMap<AllocationId, Allocation>,
    /// Pair index enforcing one allocation per (requester, resource).
    pairs: HashMap<(RequesterId, ResourceId), AllocationId>,
    /// Per-resource counts, maintained on insert.
    counts: HashMap<ResourceId, usize>,
}

impl InMemoryAllocations {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            allocations: HashMap::new(),
            pairs: HashMap::new(),
            counts: HashMap::new(),
        }
    }
}

impl Default for InMemoryAllocations {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStore for InMemoryAllocations {
    fn insert(&mut self, allocation: Allocation) -> Result<(), AdmissionError> {
        let pair = (allocation.requester, allocation.resource);
        if self.pairs.contains_key(&pair) {
            return Err(AdmissionError::DuplicateAllocation);
        }
        self.pairs.insert(pair, allocation.id);
        *self.counts.entry(allocation.resource).or_insert(0) += 1;
        self.allocations.insert(allocation.id, allocation);
        Ok(())
    }

    fn get(&self, id: AllocationId) -> Result<Option<Allocation>, AdmissionError> {
        Ok(self.allocations.get(&id).cloned())
    }

    fn exists(
        &self,
        requester: RequesterId,
        resource: ResourceId,
    ) -> Result<bool, AdmissionError> {
        Ok(self.pairs.contains_key(&(requester, resource)))
    }

    fn count_for(&self, resource: ResourceId) -> Result<usize, AdmissionError> {
        Ok(self.counts.get(&resource).copied().unwrap_or(0))
    }
}
