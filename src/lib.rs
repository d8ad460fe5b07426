//! # Seatkeeper
//!
//! Capacity-bounded admission control with deterministic waitlist promotion.
//!
//! This library manages allocation of a strictly capacity-bounded resource
//! (a course seat) among competing requesters, mediated by reviewers.
//! Requests are queued, prioritized, and admitted or waitlisted such that
//! the resource is never over-allocated, duplicate allocations never occur,
//! and waitlisted requests are promoted in a deterministic, fair order as
//! capacity frees.
//!
//! ## Core Problem Solved
//!
//! Admission under concurrency is easy to get subtly wrong:
//!
//! - **Last-seat races**: two approvals must never both consume the final
//!   seat. The capacity re-check and the allocation insert form one atomic
//!   unit under a per-resource admission lock.
//! - **Duplicate admissions**: uniqueness of allocations and of active
//!   requests per (requester, resource) pair is a constraint of the store
//!   insert itself, not a check-then-insert in the caller.
//! - **Fair promotion**: when seats free up, waitlisted requests are
//!   promoted in a total order (priority descending, submission time
//!   ascending) by a bounded, per-resource-serialized pass.
//!
//! ## Quick Start
//!
//! ```rust
//! use seatkeeper::core::{AdmissionController, Resource, RequestStatus};
//! use seatkeeper::infra::{InMemoryAllocations, InMemoryLedger};
//! use seatkeeper::util::serde::{RequesterId, ReviewerId};
//!
//! let controller = AdmissionController::new(InMemoryLedger::new(), InMemoryAllocations::new());
//!
//! let course = Resource::new(1, None);
//! let course_id = course.id;
//! controller.register(course).unwrap();
//!
//! // First request finds a free seat and awaits review.
//! let request = controller
//!     .submit(RequesterId::new(), course_id, 0, "")
//!     .unwrap();
//! assert_eq!(request.status, RequestStatus::Pending);
//!
//! // Approval atomically converts the request into an allocation.
//! let allocation = controller.approve(request.id, ReviewerId::new()).unwrap();
//! assert!(controller.resource_summary(course_id).unwrap().is_full);
//!
//! // Further requests are waitlisted until a promotion pass finds room.
//! let waitlisted = controller
//!     .submit(RequesterId::new(), course_id, 0, "")
//!     .unwrap();
//! assert_eq!(waitlisted.status, RequestStatus::Waitlisted);
//! # let _ = allocation;
//! ```
//!
//! External collaborators are injected at the seams: an
//! [`crate::core::AuthorizationGate`] answers "may this reviewer act on this
//! resource", and an [`crate::core::ActivityRecorder`] receives best-effort events
//! that never fail an operation. HTTP routing, authentication, rendering,
//! and notification delivery live outside this crate and consume these
//! interfaces.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

/// Builders to construct admission controllers from configuration.
pub mod builders;
/// Configuration models for stores, recording, and resource seeding.
pub mod config;
/// Core admission abstractions: state machine, accounting, controller.
pub mod core;
/// Infrastructure adapters for request and allocation storage backends.
pub mod infra;
/// Shared utilities.
pub mod util;
