//! Concurrency tests for the capacity and uniqueness invariants.
//!
//! These validate:
//! 1. N concurrent approvals against K seats admit exactly K
//! 2. Two approvals never both take the last seat
//! 3. Concurrent submits for one pair leave exactly one active request
//! 4. Different resources admit independently under contention

use std::sync::{Arc, Barrier};
use std::thread;

use rand::seq::SliceRandom;
use seatkeeper::core::{AdmissionController, AdmissionError, Resource, RequestStatus};
use seatkeeper::infra::{InMemoryAllocations, InMemoryLedger};
use seatkeeper::util::serde::{RequesterId, ReviewerId};

type Controller = AdmissionController<InMemoryLedger, InMemoryAllocations>;

fn controller() -> Arc<Controller> {
    Arc::new(AdmissionController::new(
        InMemoryLedger::new(),
        InMemoryAllocations::new(),
    ))
}

#[test]
fn test_exactly_k_of_n_concurrent_approvals_succeed() {
    const SEATS: u32 = 3;
    const REQUESTS: usize = 8;

    let c = controller();
    // Register wide open so every request lands pending, then shrink the
    // capacity: promotion passes have no waitlist to touch and each thread's
    // outcome is purely its own approval.
    let resource = Resource::new(REQUESTS as u32, None);
    let course = resource.id;
    c.register(resource).unwrap();

    let mut request_ids = Vec::new();
    for _ in 0..REQUESTS {
        request_ids.push(c.submit(RequesterId::new(), course, 0, "").unwrap().id);
    }
    c.set_capacity(course, SEATS).unwrap();

    request_ids.shuffle(&mut rand::rng());

    let barrier = Arc::new(Barrier::new(REQUESTS));
    let handles: Vec<_> = request_ids
        .into_iter()
        .map(|request_id| {
            let c = Arc::clone(&c);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                c.approve(request_id, ReviewerId::new())
            })
        })
        .collect();

    let mut admitted = 0;
    let mut full = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => admitted += 1,
            Err(AdmissionError::ResourceFull) => full += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(admitted, SEATS as usize);
    assert_eq!(full, REQUESTS - SEATS as usize);

    let summary = c.resource_summary(course).unwrap();
    assert_eq!(summary.allocated, SEATS);
    assert!(summary.is_full);
}

#[test]
fn test_last_seat_is_granted_once() {
    let c = controller();
    let resource = Resource::new(2, None);
    let course = resource.id;
    c.register(resource).unwrap();

    let first = c.submit(RequesterId::new(), course, 0, "").unwrap();
    let second = c.submit(RequesterId::new(), course, 0, "").unwrap();
    c.set_capacity(course, 1).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|request_id| {
            let c = Arc::clone(&c);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                c.approve(request_id, ReviewerId::new())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AdmissionError::ResourceFull))));
    assert_eq!(c.resource_summary(course).unwrap().allocated, 1);
}

#[test]
fn test_concurrent_submits_leave_one_active_request() {
    const THREADS: usize = 8;

    let c = controller();
    let resource = Resource::new(5, None);
    let course = resource.id;
    c.register(resource).unwrap();
    let requester = RequesterId::new();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let c = Arc::clone(&c);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                c.submit(requester, course, 0, "")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let created = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(AdmissionError::DuplicateActiveRequest)))
        .count();
    assert_eq!(created, 1);
    assert_eq!(duplicates, THREADS - 1);

    let queue = c.list_pending(course).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].requester, requester);
}

#[test]
fn test_resources_admit_independently() {
    const PER_RESOURCE: usize = 4;

    let c = controller();
    let mut courses = Vec::new();
    for _ in 0..3 {
        let resource = Resource::new(1, None);
        courses.push(resource.id);
        c.register(resource).unwrap();
    }

    let barrier = Arc::new(Barrier::new(courses.len() * PER_RESOURCE));
    let mut handles = Vec::new();
    for &course in &courses {
        for _ in 0..PER_RESOURCE {
            let c = Arc::clone(&c);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                let request = c.submit(RequesterId::new(), course, 0, "")?;
                if request.status == RequestStatus::Pending {
                    c.approve(request.id, ReviewerId::new()).map(|_| ())
                } else {
                    Ok(())
                }
            }));
        }
    }
    for handle in handles {
        match handle.join().unwrap() {
            Ok(()) | Err(AdmissionError::ResourceFull) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    // Each course filled its single seat exactly once.
    for course in courses {
        let summary = c.resource_summary(course).unwrap();
        assert_eq!(summary.allocated, 1);
        assert!(summary.is_full);
    }
}
