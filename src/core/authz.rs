//! Authorization gate abstraction.
//!
//! The core does not implement authentication. Callers inject a predicate
//! answering "may this reviewer act on this resource"; when none is injected
//! the controller enforces every other invariant and admits any reviewer.

use crate::util::serde::{ResourceId, ReviewerId};

/// Predicate deciding whether a reviewer may approve or reject requests for
/// a resource.
pub trait AuthorizationGate: Send + Sync {
    /// Whether `reviewer` may act on `resource`.
    fn authorize(&self, reviewer: ReviewerId, resource: ResourceId) -> bool;
}

/// Gate that admits every reviewer. The default when no gate is injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationGate for AllowAll {
    fn authorize(&self, _reviewer: ReviewerId, _resource: ResourceId) -> bool {
        true
    }
}

/// Adapter turning a closure into a gate.
pub struct GateFn<F>(
    /// The wrapped predicate.
    pub F,
);

impl<F> AuthorizationGate for GateFn<F>
where
    F: Fn(ReviewerId, ResourceId) -> bool + Send + Sync,
{
    fn authorize(&self, reviewer: ReviewerId, resource: ResourceId) -> bool {
        (self.0)(reviewer, resource)
    }
}
