//! Core admission abstractions: the request state machine, capacity
//! accounting, and the orchestrating controller.

pub mod authz;
pub mod controller;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod recorder;

pub use authz::{AllowAll, AuthorizationGate, GateFn};
pub use controller::{Actor, AdmissionController, DEFAULT_CONFLICT_RETRIES};
pub use error::{AdmissionError, AppResult};
pub use ledger::{
    promotion_order, validate_submission, Allocation, AllocationStore, Request, RequestLedger,
    RequestStatus,
};
pub use pool::{Resource, ResourceSummary};
pub use recorder::{
    build_activity_event, ActivityEvent, ActivityRecorder, InMemoryActivityRecorder,
    PostgresActivityRecorder,
};
