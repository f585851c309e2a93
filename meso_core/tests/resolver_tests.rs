//! Folder and routine lookup tests.
//!
//! These tests verify:
//! - Folders are found on any page, and created only when absent
//! - Listings stop on page_count, on a short page, or at the page ceiling
//! - A short page ends the walk even when page_count overstates the pages
//! - Routine matches require both title and folder
//! - The memoized listing refetches only after invalidation

mod common;

use common::FakeService;
use meso_core::resolver::{RemoteResolver, RoutineListing};
use meso_core::{Method, RetryPolicy};

fn gets(service: &FakeService) -> usize {
    service
        .requests()
        .iter()
        .filter(|r| r.method == Method::Get)
        .count()
}

#[test]
fn test_ensure_folder_found_on_later_page() {
    let service = FakeService::new();
    service.add_folder(1, "Old");
    service.add_folder(2, "Older");
    service.add_folder(3, "Plan");
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 2, 100);

    let folder = resolver.ensure_folder("Plan").unwrap();
    assert_eq!(folder.id, 3);
    assert_eq!(gets(&service), 2);
    assert!(service.writes().is_empty());
}

#[test]
fn test_ensure_folder_creates_when_missing() {
    let service = FakeService::new();
    service.add_folder(1, "Old");
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 10, 100);

    let folder = resolver.ensure_folder("Plan").unwrap();
    assert_eq!(folder.title, "Plan");

    let writes = service.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "/v1/routine_folders");
    assert_eq!(
        writes[0].body.as_ref().unwrap(),
        &serde_json::json!({"routine_folder": {"title": "Plan"}})
    );

    // A second call finds the folder it just created
    let again = resolver.ensure_folder("Plan").unwrap();
    assert_eq!(again.id, folder.id);
    assert_eq!(service.writes().len(), 1);
}

#[test]
fn test_listing_stops_at_page_count() {
    let service = FakeService::new();
    for i in 0..4 {
        service.add_routine(&format!("r{}", i), &format!("Routine {}", i), Some(1));
    }
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 2, 100);

    let routines = resolver.list_routines().unwrap();
    assert_eq!(routines.len(), 4);
    // Both pages are full; page_count ends the walk
    assert_eq!(gets(&service), 2);
}

#[test]
fn test_listing_without_page_count_stops_on_short_page() {
    let service = FakeService::without_page_count();
    for i in 0..3 {
        service.add_routine(&format!("r{}", i), &format!("Routine {}", i), Some(1));
    }
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 2, 100);

    assert_eq!(resolver.list_routines().unwrap().len(), 3);
    assert_eq!(gets(&service), 2);
}

#[test]
fn test_listing_without_page_count_stops_on_empty_page() {
    let service = FakeService::without_page_count();
    for i in 0..4 {
        service.add_routine(&format!("r{}", i), &format!("Routine {}", i), Some(1));
    }
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 2, 100);

    assert_eq!(resolver.list_routines().unwrap().len(), 4);
    assert_eq!(gets(&service), 3);
}

#[test]
fn test_short_page_wins_over_overstated_page_count() {
    let service = FakeService::with_page_count(50);
    service.add_routine("a", "W1 — Push", Some(1));
    service.add_routine("b", "W1 — Pull", Some(1));
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 10, 100);

    assert!(resolver.find_routine(1, "Missing").unwrap().is_none());
    assert_eq!(gets(&service), 1);
}

#[test]
fn test_overstated_page_count_folder_lookup() {
    let service = FakeService::with_page_count(50);
    for i in 0..3 {
        service.add_folder(i, &format!("Folder {}", i));
    }
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 2, 100);

    // Page 1 is full, page 2 is short: two reads, then the create
    let folder = resolver.ensure_folder("Plan").unwrap();
    assert_eq!(folder.title, "Plan");
    assert_eq!(gets(&service), 2);
    assert_eq!(service.writes().len(), 1);
}

#[test]
fn test_listing_stops_at_page_ceiling() {
    let service = FakeService::without_page_count();
    for i in 0..10 {
        service.add_routine(&format!("r{}", i), &format!("Routine {}", i), Some(1));
    }
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 2, 3);

    assert_eq!(resolver.list_routines().unwrap().len(), 6);
    assert_eq!(gets(&service), 3);
}

#[test]
fn test_find_routine_requires_folder_match() {
    let service = FakeService::new();
    service.add_routine("a", "W1 — Push", Some(1));
    service.add_routine("b", "W1 — Push", Some(2));
    service.add_routine("c", "W1 — Push", None);
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 10, 100);

    assert_eq!(resolver.find_routine(2, "W1 — Push").unwrap().unwrap().id, "b");
    assert!(resolver.find_routine(3, "W1 — Push").unwrap().is_none());
    assert!(resolver.find_routine(1, "W1 — Pull").unwrap().is_none());
}

#[test]
fn test_empty_account_lists_single_page() {
    let service = FakeService::new();
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 10, 100);

    assert!(resolver.list_routines().unwrap().is_empty());
    assert_eq!(gets(&service), 1);
}

#[test]
fn test_memoized_listing_refetches_after_invalidate() {
    let service = FakeService::new();
    service.add_routine("a", "W1 — Push", Some(1));
    let retry = RetryPolicy::immediate(3);
    let resolver = RemoteResolver::new(&service, &retry, 10, 100);
    let mut listing = RoutineListing::new();
    assert!(!listing.is_loaded());

    assert!(listing.find(&resolver, 1, "W1 — Push").unwrap().is_some());
    assert!(listing.find(&resolver, 1, "W1 — Pull").unwrap().is_none());
    assert!(listing.is_loaded());
    assert_eq!(gets(&service), 1);

    service.add_routine("b", "W1 — Pull", Some(1));
    assert!(listing.find(&resolver, 1, "W1 — Pull").unwrap().is_none());

    listing.invalidate();
    assert!(!listing.is_loaded());
    assert_eq!(listing.find(&resolver, 1, "W1 — Pull").unwrap().unwrap().id, "b");
    assert_eq!(gets(&service), 2);
}
