//! Postgres-backed store adapters (schema and interface stubs).
//!
//! The migrations carry the constraints the core depends on: a partial
//! unique index restricting (requester, resource) to one non-terminal
//! request, and a plain unique index on allocation pairs. Actual I/O
//! requires a runtime + client and is left to the integration layer.

use crate::core::error::AdmissionError;
use crate::core::ledger::{Allocation, AllocationStore, Request, RequestLedger};
use crate::util::serde::{AllocationId, RequestId, RequesterId, ResourceId};

/// Postgres request ledger adapter placeholder.
pub struct PostgresLedger;

impl PostgresLedger {
    /// Migration statements for the resource catalog and request ledger.
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS sk_resources (
    id UUID PRIMARY KEY,
    capacity INT NOT NULL CHECK (capacity > 0),
    deadline_ms NUMERIC
);
CREATE TABLE IF NOT EXISTS sk_requests (
    id UUID PRIMARY KEY,
    requester_id UUID NOT NULL,
    resource_id UUID NOT NULL REFERENCES sk_resources (id),
    status TEXT NOT NULL CHECK (status IN ('pending', 'waitlisted', 'approved', 'rejected')),
    priority INT NOT NULL DEFAULT 0,
    requested_at_ms NUMERIC NOT NULL,
    reviewed_by UUID,
    reviewed_at_ms NUMERIC,
    notes TEXT NOT NULL DEFAULT '',
    deadline_ms NUMERIC
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_sk_requests_active_pair
    ON sk_requests (requester_id, resource_id)
    WHERE status IN ('pending', 'waitlisted');
CREATE INDEX IF NOT EXISTS idx_sk_requests_waitlist
    ON sk_requests (resource_id, priority DESC, requested_at_ms)
    WHERE status = 'waitlisted';
"#,
        ]
    }
}

impl RequestLedger for PostgresLedger {
    fn insert(&mut self, _request: Request) -> Result<(), AdmissionError> {
        Err(AdmissionError::Backend(
            "postgres ledger not wired to database client".into(),
        ))
    }

    fn get(&self, _id: RequestId) -> Result<Option<Request>, AdmissionError> {
        Err(AdmissionError::Backend(
            "postgres ledger not wired to database client".into(),
        ))
    }

    fn update(&mut self, _request: &Request) -> Result<(), AdmissionError> {
        Err(AdmissionError::Backend(
            "postgres ledger not wired to database client".into(),
        ))
    }

    fn next_waitlisted(&self, _resource: ResourceId) -> Result<Option<Request>, AdmissionError> {
        Err(AdmissionError::Backend(
            "postgres ledger not wired to database client".into(),
        ))
    }

    fn waitlisted_count(&self, _resource: ResourceId) -> Result<usize, AdmissionError> {
        Ok(0)
    }

    fn pending_count(&self, _resource: ResourceId) -> Result<usize, AdmissionError> {
        Ok(0)
    }

    fn active_for_resource(&self, _resource: ResourceId) -> Result<Vec<Request>, AdmissionError> {
        Ok(Vec::new())
    }
}

/// Postgres allocation store adapter placeholder.
pub struct PostgresAllocations;

impl PostgresAllocations {
    /// Migration statements for the allocation store.
    pub fn migrations() -> &'static [&'static str] {
        &[
            r#"
CREATE TABLE IF NOT EXISTS sk_allocations (
    id UUID PRIMARY KEY,
    requester_id UUID NOT NULL,
    resource_id UUID NOT NULL REFERENCES sk_resources (id),
    assigned_by UUID,
    created_at_ms NUMERIC NOT NULL,
    grade JSONB
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_sk_allocations_pair
    ON sk_allocations (requester_id, resource_id);
CREATE INDEX IF NOT EXISTS idx_sk_allocations_resource ON sk_allocations (resource_id);
"#,
        ]
    }
}

impl AllocationStore for PostgresAllocations {
    fn insert(&mut self, _allocation: Allocation) -> Result<(), AdmissionError> {
        Err(AdmissionError::Backend(
            "postgres allocation store not wired to database client".into(),
        ))
    }

    fn get(&self, _id: AllocationId) -> Result<Option<Allocation>, AdmissionError> {
        Err(AdmissionError::Backend(
            "postgres allocation store not wired to database client".into(),
        ))
    }

    fn exists(
        &self,
        _requester: RequesterId,
        _resource: ResourceId,
    ) -> Result<bool, AdmissionError> {
        Err(AdmissionError::Backend(
            "postgres allocation store not wired to database client".into(),
        ))
    }

    fn count_for(&self, _resource: ResourceId) -> Result<usize, AdmissionError> {
        Ok(0)
    }
}
