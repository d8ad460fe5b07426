//! Request/allocation records, the request state machine, and store traits.
//!
//! A request moves `Pending`/`Waitlisted` -> `Approved` or `Rejected`; the
//! terminal states are absorbing. Status transitions here are pure metadata
//! moves: capacity is enforced by the controller, uniqueness by the stores.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::error::AdmissionError;
use crate::core::pool::Resource;
use crate::util::serde::{AllocationId, Priority, RequestId, RequesterId, ResourceId, ReviewerId};

/// Status of an admission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting review; capacity was available at submission.
    Pending,
    /// Awaiting review behind capacity; eligible for promotion.
    Waitlisted,
    /// Converted into an allocation. Terminal.
    Approved,
    /// Declined by a reviewer. Terminal.
    Rejected,
}

impl RequestStatus {
    /// Whether this status is absorbing.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// An admission request: one requester's intent to consume one unit of one
/// resource's capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request identifier.
    pub id: RequestId,
    /// Requester seeking the allocation.
    pub requester: RequesterId,
    /// Target resource.
    pub resource: ResourceId,
    /// Current lifecycle status.
    pub status: RequestStatus,
    /// Queue priority; higher is served first.
    pub priority: Priority,
    /// Submission timestamp (ms since epoch).
    pub requested_at_ms: u128,
    /// Reviewer who settled the request. `None` while open, and stays `None`
    /// for system-driven promotions.
    pub reviewed_by: Option<ReviewerId>,
    /// When the request was settled (ms since epoch).
    pub reviewed_at_ms: Option<u128>,
    /// Free-form notes; annotated on waitlisting, replaced on rejection.
    pub notes: String,
    /// Snapshot of the resource deadline at submission time. Stable even if
    /// the resource deadline later changes.
    pub deadline_ms: Option<u128>,
}

impl Request {
    /// Transition to `Approved`, recording the reviewer and timestamp.
    ///
    /// Fails with [`AdmissionError::AlreadyTerminal`] if the request is
    /// settled; terminal rows keep their original review metadata.
    pub fn mark_approved(
        &mut self,
        reviewer: Option<ReviewerId>,
        now_ms: u128,
    ) -> Result<(), AdmissionError> {
        if self.status.is_terminal() {
            return Err(AdmissionError::AlreadyTerminal);
        }
        self.status = RequestStatus::Approved;
        self.reviewed_by = reviewer;
        self.reviewed_at_ms = Some(now_ms);
        Ok(())
    }

    /// Transition to `Rejected`, recording reviewer, timestamp, and reason.
    ///
    /// Fails with [`AdmissionError::AlreadyTerminal`] if the request is
    /// settled; terminal rows keep their original review metadata.
    pub fn mark_rejected(
        &mut self,
        reviewer: Option<ReviewerId>,
        reason: &str,
        now_ms: u128,
    ) -> Result<(), AdmissionError> {
        if self.status.is_terminal() {
            return Err(AdmissionError::AlreadyTerminal);
        }
        self.status = RequestStatus::Rejected;
        self.reviewed_by = reviewer;
        self.reviewed_at_ms = Some(now_ms);
        if !reason.is_empty() {
            self.notes = reason.to_string();
        }
        Ok(())
    }
}

/// A confirmed, durable consumption of one capacity unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    /// Allocation identifier.
    pub id: AllocationId,
    /// Holder of the seat.
    pub requester: RequesterId,
    /// Resource the seat belongs to.
    pub resource: ResourceId,
    /// Reviewer who granted the seat; `None` for system-driven promotions.
    pub assigned_by: Option<ReviewerId>,
    /// Creation timestamp (ms since epoch).
    pub created_at_ms: u128,
    /// Opaque grade payload. Carried for external collaborators, never
    /// interpreted by the core.
    pub grade: Option<serde_json::Value>,
}

/// Pure submission validation, separated from the commit path so the
/// deadline/duplicate/capacity decision is testable without a store.
///
/// `occupied` is the submission-time occupancy: confirmed allocations plus
/// pending requests, each of which claims a seat. Returns the initial status
/// a new request must take: `Waitlisted` when occupancy has reached capacity,
/// `Pending` otherwise. Duplicate *active* requests are the ledger insert's
/// concern (a store-level constraint), not checked here.
pub fn validate_submission(
    resource: &Resource,
    occupied: usize,
    has_allocation: bool,
    now_ms: u128,
) -> Result<RequestStatus, AdmissionError> {
    if !resource.is_open(now_ms) {
        return Err(AdmissionError::DeadlinePassed);
    }
    if has_allocation {
        return Err(AdmissionError::DuplicateAllocation);
    }
    if resource.is_full(occupied) {
        Ok(RequestStatus::Waitlisted)
    } else {
        Ok(RequestStatus::Pending)
    }
}

/// Total promotion order over a resource's queue: priority descending, then
/// submission time ascending (FIFO), then request id as a deterministic
/// tie-break for colliding timestamps.
pub fn promotion_order(a: &Request, b: &Request) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then(a.requested_at_ms.cmp(&b.requested_at_ms))
        .then(a.id.cmp(&b.id))
}

/// Durable queue of admission requests.
///
/// Implementations must enforce the active-uniqueness constraint inside
/// `insert` itself (at most one non-terminal request per (requester,
/// resource) pair), not leave it to callers, so concurrent submits cannot
/// race a check-then-insert.
pub trait RequestLedger: Send {
    /// Insert a new request. Fails with
    /// [`AdmissionError::DuplicateActiveRequest`] if the pair already has a
    /// non-terminal request.
    fn insert(&mut self, request: Request) -> Result<(), AdmissionError>;
    /// Fetch a request by id.
    fn get(&self, id: RequestId) -> Result<Option<Request>, AdmissionError>;
    /// Persist an updated request. Fails with [`AdmissionError::NotFound`]
    /// if the request was never inserted.
    fn update(&mut self, request: &Request) -> Result<(), AdmissionError>;
    /// Next waitlisted request for the resource in promotion order, if any.
    fn next_waitlisted(&self, resource: ResourceId) -> Result<Option<Request>, AdmissionError>;
    /// Number of currently waitlisted requests for the resource. Bounds the
    /// promotion loop.
    fn waitlisted_count(&self, resource: ResourceId) -> Result<usize, AdmissionError>;
    /// Number of currently pending requests for the resource. Each pending
    /// request claims a seat for the submission occupancy check.
    fn pending_count(&self, resource: ResourceId) -> Result<usize, AdmissionError>;
    /// All non-terminal requests for the resource in promotion order.
    fn active_for_resource(&self, resource: ResourceId) -> Result<Vec<Request>, AdmissionError>;
}

/// Durable set of confirmed allocations.
///
/// Implementations must enforce pair uniqueness inside `insert` (at most one
/// allocation per (requester, resource) pair).
pub trait AllocationStore: Send {
    /// Insert a new allocation. Fails with
    /// [`AdmissionError::DuplicateAllocation`] if the pair already holds one.
    fn insert(&mut self, allocation: Allocation) -> Result<(), AdmissionError>;
    /// Fetch an allocation by id.
    fn get(&self, id: AllocationId) -> Result<Option<Allocation>, AdmissionError>;
    /// Whether the pair already holds an allocation.
    fn exists(&self, requester: RequesterId, resource: ResourceId)
        -> Result<bool, AdmissionError>;
    /// Number of allocations for the resource.
    fn count_for(&self, resource: ResourceId) -> Result<usize, AdmissionError>;
}
