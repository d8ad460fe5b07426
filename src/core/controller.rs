//! Admission orchestration: submit, approve, reject, and promotion.
//!
//! The controller owns the consistency boundary. Every mutation of one
//! resource's (requests, allocations) pair runs under that resource's
//! admission lock, so the capacity re-check and the allocation insert in
//! `approve` form a single atomic unit and promotion passes are never
//! re-entered concurrently for the same resource. Operations on different
//! resources share nothing but the store mutexes and proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::core::authz::AuthorizationGate;
use crate::core::error::AdmissionError;
use crate::core::ledger::{
    validate_submission, Allocation, AllocationStore, Request, RequestLedger, RequestStatus,
};
use crate::core::pool::{Resource, ResourceSummary};
use crate::core::recorder::{build_activity_event, ActivityRecorder};
use crate::util::clock::now_ms;
use crate::util::serde::{AllocationId, Priority, RequestId, RequesterId, ResourceId, ReviewerId};

/// Default bound for transparent retries of storage conflicts.
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Typed acting identity for review decisions.
///
/// Promotion runs as [`Actor::System`]: an explicit system path with its own
/// audit label and `assigned_by = None`, never an impersonated reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// A reviewer acting on their own authority, subject to the gate.
    Reviewer(ReviewerId),
    /// The promotion machinery. Bypasses the gate; leaves no reviewer id.
    System,
}

impl Actor {
    /// The reviewer identity to stamp on records, if any.
    pub fn reviewer(self) -> Option<ReviewerId> {
        match self {
            Self::Reviewer(id) => Some(id),
            Self::System => None,
        }
    }

    /// Audit label for this actor.
    pub fn label(self) -> String {
        match self {
            Self::Reviewer(id) => id.to_string(),
            Self::System => "system".to_string(),
        }
    }
}

/// Orchestrates admission requests against a request ledger and an
/// allocation store.
///
/// Capacity is never cached: every decision re-derives occupancy from the
/// allocation store under the resource's admission lock.
pub struct AdmissionController<L, A> {
    resources: RwLock<HashMap<ResourceId, Resource>>,
    ledger: Mutex<L>,
    allocations: Mutex<A>,
    /// Per-resource admission locks, created lazily. The unit of contention
    /// is the (resource, ledger, allocations) triple for one resource id.
    admission_locks: Mutex<HashMap<ResourceId, Arc<Mutex<()>>>>,
    gate: Option<Box<dyn AuthorizationGate>>,
    recorder: Option<Mutex<Box<dyn ActivityRecorder>>>,
    max_conflict_retries: u32,
}

impl<L, A> AdmissionController<L, A>
where
    L: RequestLedger,
    A: AllocationStore,
{
    /// Create a controller over the given stores.
    pub fn new(ledger: L, allocations: A) -> Self {
        Self {
            resources: RwLock::new(HashMap::new()),
            ledger: Mutex::new(ledger),
            allocations: Mutex::new(allocations),
            admission_locks: Mutex::new(HashMap::new()),
            gate: None,
            recorder: None,
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    /// Attach an authorization gate consulted before approve/reject.
    pub fn with_gate(mut self, gate: Box<dyn AuthorizationGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Attach a best-effort activity recorder.
    pub fn with_recorder(mut self, recorder: Box<dyn ActivityRecorder>) -> Self {
        self.recorder = Some(Mutex::new(recorder));
        self
    }

    /// Override the bound on transparent storage-conflict retries.
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Register a resource in the catalog.
    pub fn register(&self, resource: Resource) -> Result<(), AdmissionError> {
        if resource.capacity == 0 {
            return Err(AdmissionError::Backend("capacity must be positive".into()));
        }
        let mut resources = self.resources.write();
        if resources.contains_key(&resource.id) {
            return Err(AdmissionError::Backend(format!(
                "resource {} already registered",
                resource.id
            )));
        }
        resources.insert(resource.id, resource);
        Ok(())
    }

    /// Change a resource's capacity.
    ///
    /// A capacity increase does not promote anyone by itself; callers invoke
    /// [`AdmissionController::promote`] explicitly when they want waitlisted
    /// requests to fill the new seats.
    pub fn set_capacity(&self, resource: ResourceId, capacity: u32) -> Result<(), AdmissionError> {
        if capacity == 0 {
            return Err(AdmissionError::Backend("capacity must be positive".into()));
        }
        let mut resources = self.resources.write();
        let entry = resources
            .get_mut(&resource)
            .ok_or_else(|| AdmissionError::NotFound(format!("resource {resource}")))?;
        entry.capacity = capacity;
        Ok(())
    }

    /// Change a resource's submission deadline. Requests already submitted
    /// keep their snapshot of the old deadline.
    pub fn set_deadline(
        &self,
        resource: ResourceId,
        deadline_ms: Option<u128>,
    ) -> Result<(), AdmissionError> {
        let mut resources = self.resources.write();
        let entry = resources
            .get_mut(&resource)
            .ok_or_else(|| AdmissionError::NotFound(format!("resource {resource}")))?;
        entry.deadline_ms = deadline_ms;
        Ok(())
    }

    /// Submit an admission request.
    ///
    /// The request is created `Pending` when a seat is still unclaimed, and
    /// `Waitlisted` (with an annotation naming the occupancy at submission)
    /// when every seat is held by an allocation or claimed by a pending
    /// request. The resource deadline is snapshotted onto the request.
    pub fn submit(
        &self,
        requester: RequesterId,
        resource: ResourceId,
        priority: Priority,
        notes: &str,
    ) -> Result<Request, AdmissionError> {
        let admission = self.admission_lock(resource);
        let _guard = admission.lock();

        let entry = self.resource_entry(resource)?;
        let now = now_ms();
        let (allocated, has_allocation) = {
            let allocations = self.allocations.lock();
            (
                allocations.count_for(resource)?,
                allocations.exists(requester, resource)?,
            )
        };
        // Each pending request is an uncommitted claim on a seat; counting
        // them here keeps capacity+1 submissions from all landing pending.
        let occupied = allocated + self.ledger.lock().pending_count(resource)?;
        let status = validate_submission(&entry, occupied, has_allocation, now)?;

        let mut notes = notes.to_string();
        if status == RequestStatus::Waitlisted {
            let annotation = format!(
                "automatically waitlisted - resource at capacity ({occupied}/{})",
                entry.capacity
            );
            notes = if notes.is_empty() {
                annotation
            } else {
                format!("{notes}; {annotation}")
            };
        }

        let request = Request {
            id: RequestId::new(),
            requester,
            resource,
            status,
            priority,
            requested_at_ms: now,
            reviewed_by: None,
            reviewed_at_ms: None,
            notes,
            deadline_ms: entry.deadline_ms,
        };
        // The ledger insert enforces active-pair uniqueness, closing the
        // race between concurrent submits for the same pair.
        self.retry_conflicts(|| self.ledger.lock().insert(request.clone()))?;

        tracing::info!(
            "request {} submitted for resource {} ({:?})",
            request.id,
            resource,
            status
        );
        let action = if status == RequestStatus::Waitlisted {
            "waitlist"
        } else {
            "submit"
        };
        self.record(build_activity_event(
            request.id,
            resource,
            requester.to_string(),
            action,
            None,
        ));
        Ok(request)
    }

    /// Approve a request, converting it into an allocation.
    ///
    /// Fullness is re-checked and the allocation inserted under the
    /// resource's admission lock; two approvals racing for the last seat
    /// cannot both succeed. On success a promotion pass runs for the
    /// resource as a self-healing consistency sweep, even though the
    /// approval itself consumed a seat rather than freeing one.
    pub fn approve(
        &self,
        request_id: RequestId,
        reviewer: ReviewerId,
    ) -> Result<Allocation, AdmissionError> {
        let resource = self.resource_of(request_id)?;
        let allocation = {
            let admission = self.admission_lock(resource);
            let _guard = admission.lock();
            self.admit_locked(request_id, Actor::Reviewer(reviewer))?
        };
        let promoted = self.promote(resource)?;
        if !promoted.is_empty() {
            tracing::info!(
                "approval of {} promoted {} waitlisted request(s)",
                request_id,
                promoted.len()
            );
        }
        Ok(allocation)
    }

    /// Reject a request. Terminal, no resource-pool side effects.
    ///
    /// Rejecting an already-settled request fails with `AlreadyTerminal` and
    /// leaves the existing review metadata untouched.
    pub fn reject(
        &self,
        request_id: RequestId,
        reviewer: ReviewerId,
        reason: &str,
    ) -> Result<Request, AdmissionError> {
        let resource = self.resource_of(request_id)?;
        let admission = self.admission_lock(resource);
        let _guard = admission.lock();

        let mut request = self.request_entry(request_id)?;
        if request.status.is_terminal() {
            return Err(AdmissionError::AlreadyTerminal);
        }
        self.check_gate(Actor::Reviewer(reviewer), resource)?;

        request.mark_rejected(Some(reviewer), reason, now_ms())?;
        self.retry_conflicts(|| self.ledger.lock().update(&request))?;

        tracing::info!("request {} rejected by {}", request_id, reviewer);
        let details = (!reason.is_empty()).then(|| reason.to_string());
        self.record(build_activity_event(
            request_id,
            resource,
            reviewer.to_string(),
            "reject",
            details,
        ));
        Ok(request)
    }

    /// Promote waitlisted requests while seats remain.
    ///
    /// The loop is bounded by the number of requests waitlisted when the
    /// pass starts, so it terminates even under pathological store failures.
    /// `ResourceFull` mid-pass is the normal stop signal, not an error; any
    /// other candidate failure is logged and stops the pass.
    pub fn promote(&self, resource: ResourceId) -> Result<Vec<Allocation>, AdmissionError> {
        let admission = self.admission_lock(resource);
        let _guard = admission.lock();
        self.promote_locked(resource)
    }

    /// Non-terminal requests for the resource in promotion order
    /// (priority descending, submission time ascending).
    pub fn list_pending(&self, resource: ResourceId) -> Result<Vec<Request>, AdmissionError> {
        self.resource_entry(resource)?;
        self.ledger.lock().active_for_resource(resource)
    }

    /// Occupancy snapshot for a resource.
    pub fn resource_summary(&self, resource: ResourceId) -> Result<ResourceSummary, AdmissionError> {
        let entry = self.resource_entry(resource)?;
        let allocations = self.allocations.lock();
        ResourceSummary::snapshot(&entry, &*allocations)
    }

    /// Fetch a request by id.
    pub fn request(&self, request_id: RequestId) -> Result<Request, AdmissionError> {
        self.request_entry(request_id)
    }

    /// Fetch an allocation by id.
    pub fn allocation(&self, allocation_id: AllocationId) -> Result<Allocation, AdmissionError> {
        self.allocations
            .lock()
            .get(allocation_id)?
            .ok_or_else(|| AdmissionError::NotFound(format!("allocation {allocation_id}")))
    }

    /// Admit one request as `actor`. Assumes the resource's admission lock
    /// is held by the caller.
    fn admit_locked(
        &self,
        request_id: RequestId,
        actor: Actor,
    ) -> Result<Allocation, AdmissionError> {
        let mut request = self.request_entry(request_id)?;
        if request.status.is_terminal() {
            return Err(AdmissionError::AlreadyTerminal);
        }
        self.check_gate(actor, request.resource)?;
        let entry = self.resource_entry(request.resource)?;

        let now = now_ms();
        let allocation = {
            let mut allocations = self.allocations.lock();
            let allocated = allocations.count_for(request.resource)?;
            if entry.is_full(allocated) {
                // Request status deliberately unchanged.
                return Err(AdmissionError::ResourceFull);
            }
            let allocation = Allocation {
                id: AllocationId::new(),
                requester: request.requester,
                resource: request.resource,
                assigned_by: actor.reviewer(),
                created_at_ms: now,
                grade: None,
            };
            // Conflict retries scope to the single store call: the insert is
            // not re-run once it has taken effect.
            self.retry_conflicts(|| allocations.insert(allocation.clone()))?;
            allocation
        };

        request.mark_approved(actor.reviewer(), now)?;
        self.retry_conflicts(|| self.ledger.lock().update(&request))?;

        let action = match actor {
            Actor::System => "promote",
            Actor::Reviewer(_) => "approve",
        };
        tracing::info!(
            "request {} approved by {} on resource {}",
            request_id,
            actor.label(),
            request.resource
        );
        self.record(build_activity_event(
            request_id,
            request.resource,
            actor.label(),
            action,
            None,
        ));
        Ok(allocation)
    }

    /// Promotion pass body. Assumes the resource's admission lock is held.
    fn promote_locked(&self, resource: ResourceId) -> Result<Vec<Allocation>, AdmissionError> {
        self.resource_entry(resource)?;
        let bound = self.ledger.lock().waitlisted_count(resource)?;
        let mut promoted = Vec::new();

        for _ in 0..bound {
            // Re-read the catalog entry so a capacity change mid-pass is
            // observed on the next iteration.
            let entry = self.resource_entry(resource)?;
            let allocated = self.allocations.lock().count_for(resource)?;
            if entry.is_full(allocated) {
                break;
            }
            let candidate = match self.ledger.lock().next_waitlisted(resource)? {
                Some(request) => request,
                None => break,
            };
            match self.admit_locked(candidate.id, Actor::System) {
                Ok(allocation) => promoted.push(allocation),
                Err(AdmissionError::ResourceFull) => break,
                Err(e) => {
                    tracing::warn!(
                        "promotion of {} on resource {} failed: {e}; stopping pass",
                        candidate.id,
                        resource
                    );
                    break;
                }
            }
        }
        if !promoted.is_empty() {
            tracing::info!("promoted {} request(s) on resource {}", promoted.len(), resource);
        }
        Ok(promoted)
    }

    /// Retry `op` on retryable storage conflicts up to the configured bound.
    /// Domain errors pass through immediately.
    fn retry_conflicts<T>(
        &self,
        mut op: impl FnMut() -> Result<T, AdmissionError>,
    ) -> Result<T, AdmissionError> {
        let mut attempts = 0;
        loop {
            match op() {
                Err(e) if e.is_retryable() && attempts < self.max_conflict_retries => {
                    attempts += 1;
                    tracing::warn!("storage conflict (attempt {attempts}): {e}; retrying");
                }
                other => return other,
            }
        }
    }

    fn admission_lock(&self, resource: ResourceId) -> Arc<Mutex<()>> {
        let mut locks = self.admission_locks.lock();
        locks
            .entry(resource)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn resource_entry(&self, resource: ResourceId) -> Result<Resource, AdmissionError> {
        self.resources
            .read()
            .get(&resource)
            .cloned()
            .ok_or_else(|| AdmissionError::NotFound(format!("resource {resource}")))
    }

    fn request_entry(&self, request_id: RequestId) -> Result<Request, AdmissionError> {
        self.ledger
            .lock()
            .get(request_id)?
            .ok_or_else(|| AdmissionError::NotFound(format!("request {request_id}")))
    }

    fn resource_of(&self, request_id: RequestId) -> Result<ResourceId, AdmissionError> {
        Ok(self.request_entry(request_id)?.resource)
    }

    fn check_gate(&self, actor: Actor, resource: ResourceId) -> Result<(), AdmissionError> {
        if let Actor::Reviewer(reviewer) = actor {
            if let Some(gate) = &self.gate {
                if !gate.authorize(reviewer, resource) {
                    return Err(AdmissionError::NotAuthorized);
                }
            }
        }
        Ok(())
    }

    fn record(&self, event: crate::core::recorder::ActivityEvent) {
        if let Some(recorder) = &self.recorder {
            if let Err(e) = recorder.lock().record(event) {
                tracing::warn!("activity recorder failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recorder::ActivityEvent;
    use crate::infra::store::memory::{InMemoryAllocations, InMemoryLedger};

    type Controller = AdmissionController<InMemoryLedger, InMemoryAllocations>;

    fn controller() -> Controller {
        AdmissionController::new(InMemoryLedger::new(), InMemoryAllocations::new())
    }

    fn with_resource(capacity: u32) -> (Controller, ResourceId) {
        let c = controller();
        let resource = Resource::new(capacity, None);
        let id = resource.id;
        c.register(resource).unwrap();
        (c, id)
    }

    /// Ledger wrapper whose `update` fails with a conflict a fixed number of
    /// times before succeeding.
    struct FlakyLedger {
        inner: InMemoryLedger,
        conflicts_left: u32,
    }

    impl RequestLedger for FlakyLedger {
        fn insert(&mut self, request: Request) -> Result<(), AdmissionError> {
            self.inner.insert(request)
        }
        fn get(&self, id: RequestId) -> Result<Option<Request>, AdmissionError> {
            self.inner.get(id)
        }
        fn update(&mut self, request: &Request) -> Result<(), AdmissionError> {
            if self.conflicts_left > 0 {
                self.conflicts_left -= 1;
                return Err(AdmissionError::Conflict("serialization failure".into()));
            }
            self.inner.update(request)
        }
        fn next_waitlisted(
            &self,
            resource: ResourceId,
        ) -> Result<Option<Request>, AdmissionError> {
            self.inner.next_waitlisted(resource)
        }
        fn waitlisted_count(&self, resource: ResourceId) -> Result<usize, AdmissionError> {
            self.inner.waitlisted_count(resource)
        }
        fn pending_count(&self, resource: ResourceId) -> Result<usize, AdmissionError> {
            self.inner.pending_count(resource)
        }
        fn active_for_resource(
            &self,
            resource: ResourceId,
        ) -> Result<Vec<Request>, AdmissionError> {
            self.inner.active_for_resource(resource)
        }
    }

    struct FailingRecorder;

    impl ActivityRecorder for FailingRecorder {
        fn record(&mut self, _event: ActivityEvent) -> Result<(), AdmissionError> {
            Err(AdmissionError::Backend("sink offline".into()))
        }
    }

    #[test]
    fn test_register_rejects_zero_capacity_and_duplicates() {
        let c = controller();
        assert!(c.register(Resource::new(0, None)).is_err());

        let resource = Resource::new(1, None);
        c.register(resource.clone()).unwrap();
        assert!(c.register(resource).is_err());
    }

    #[test]
    fn test_gate_denies_unlisted_reviewer() {
        let (c, resource) = {
            let c = controller();
            let r = Resource::new(1, None);
            let id = r.id;
            c.register(r).unwrap();
            (c, id)
        };
        let allowed = ReviewerId::new();
        let c = c.with_gate(Box::new(crate::core::authz::GateFn(
            move |reviewer: ReviewerId, _: ResourceId| reviewer == allowed,
        )));

        let request = c.submit(RequesterId::new(), resource, 0, "").unwrap();
        let err = c.approve(request.id, ReviewerId::new()).unwrap_err();
        assert!(matches!(err, AdmissionError::NotAuthorized));
        // The request is untouched by the denial.
        assert_eq!(c.request(request.id).unwrap().status, RequestStatus::Pending);

        c.approve(request.id, allowed).unwrap();
    }

    #[test]
    fn test_conflict_retry_within_bound() {
        let c = AdmissionController::new(
            FlakyLedger {
                inner: InMemoryLedger::new(),
                conflicts_left: 2,
            },
            InMemoryAllocations::new(),
        );
        let resource = Resource::new(1, None);
        let resource_id = resource.id;
        c.register(resource).unwrap();

        let request = c.submit(RequesterId::new(), resource_id, 0, "").unwrap();
        // Two conflicts, three retries allowed: approval succeeds.
        let allocation = c.approve(request.id, ReviewerId::new()).unwrap();
        assert_eq!(allocation.resource, resource_id);
    }

    #[test]
    fn test_conflict_surfaces_beyond_bound() {
        let c = AdmissionController::new(
            FlakyLedger {
                inner: InMemoryLedger::new(),
                conflicts_left: 10,
            },
            InMemoryAllocations::new(),
        )
        .with_max_conflict_retries(1);
        let resource = Resource::new(1, None);
        let resource_id = resource.id;
        c.register(resource).unwrap();

        let request = c.submit(RequesterId::new(), resource_id, 0, "").unwrap();
        let err = c.approve(request.id, ReviewerId::new()).unwrap_err();
        assert!(matches!(err, AdmissionError::Conflict(_)));
    }

    #[test]
    fn test_recorder_failure_never_fails_operation() {
        let (c, resource) = with_resource(1);
        let c = c.with_recorder(Box::new(FailingRecorder));

        let request = c.submit(RequesterId::new(), resource, 0, "").unwrap();
        c.approve(request.id, ReviewerId::new()).unwrap();
    }

    #[test]
    fn test_set_capacity_does_not_promote() {
        let (c, resource) = with_resource(1);
        let reviewer = ReviewerId::new();

        let first = c.submit(RequesterId::new(), resource, 0, "").unwrap();
        c.approve(first.id, reviewer).unwrap();
        let waiting = c.submit(RequesterId::new(), resource, 0, "").unwrap();
        assert_eq!(waiting.status, RequestStatus::Waitlisted);

        c.set_capacity(resource, 2).unwrap();
        // Still waitlisted until a promotion pass is invoked.
        assert_eq!(
            c.request(waiting.id).unwrap().status,
            RequestStatus::Waitlisted
        );

        let promoted = c.promote(resource).unwrap();
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].requester, waiting.requester);
        assert!(promoted[0].assigned_by.is_none());
    }
}
