use std::sync::Arc;

use chrono::Utc;
use encore_application::{AuditRepository, CapacityStore, ReservationLedger, ReservationService};
use encore_core::{AppError, NonEmptyString, Username};
use encore_domain::{Concert, ConcertId, ConcertStatus, ReservationId};

use super::InMemoryReservationLedger;
use crate::{InMemoryAuditLog, InMemoryCapacityStore};

fn username(value: &str) -> Username {
    Username::new(value).unwrap_or_else(|_| unreachable!())
}

fn concert_name() -> NonEmptyString {
    NonEmptyString::new("The Gig").unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn insert_if_absent_rejects_second_active_reservation_for_pair() {
    let ledger = InMemoryReservationLedger::new();
    let concert_id = ConcertId::new();

    let first = ledger
        .insert_if_absent(username("alice"), concert_id, concert_name())
        .await;
    assert!(first.is_ok());

    let second = ledger
        .insert_if_absent(username("alice"), concert_id, concert_name())
        .await;
    assert!(matches!(second, Err(AppError::DuplicateActive(_))));
}

#[tokio::test]
async fn cancelled_reservation_frees_the_pair_for_a_new_insert() {
    let ledger = InMemoryReservationLedger::new();
    let concert_id = ConcertId::new();
    let alice = username("alice");

    let first = ledger
        .insert_if_absent(alice.clone(), concert_id, concert_name())
        .await;
    let first = first.unwrap_or_else(|_| unreachable!());

    let cancelled = ledger.cancel_if_owned_and_active(first.id(), &alice).await;
    assert!(cancelled.is_ok());

    let again = ledger
        .insert_if_absent(alice.clone(), concert_id, concert_name())
        .await;
    assert!(again.is_ok());

    // Both records coexist; only one is active.
    let listed = ledger.list_by_user(&alice).await.unwrap_or_default();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed.iter().filter(|entry| entry.is_active()).count(), 1);
}

#[tokio::test]
async fn cancel_checks_existence_ownership_and_liveness() {
    let ledger = InMemoryReservationLedger::new();
    let concert_id = ConcertId::new();
    let alice = username("alice");

    let missing = ledger
        .cancel_if_owned_and_active(ReservationId::new(), &alice)
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let reservation = ledger
        .insert_if_absent(alice.clone(), concert_id, concert_name())
        .await;
    let reservation = reservation.unwrap_or_else(|_| unreachable!());

    let wrong_owner = ledger
        .cancel_if_owned_and_active(reservation.id(), &username("mallory"))
        .await;
    assert!(matches!(wrong_owner, Err(AppError::NotOwner(_))));

    let first = ledger
        .cancel_if_owned_and_active(reservation.id(), &alice)
        .await;
    assert!(first.is_ok());

    let repeated = ledger
        .cancel_if_owned_and_active(reservation.id(), &alice)
        .await;
    assert!(matches!(repeated, Err(AppError::AlreadyCancelled(_))));
}

fn build_service() -> (
    ReservationService,
    Arc<InMemoryCapacityStore>,
    Arc<InMemoryAuditLog>,
) {
    let capacity_store = Arc::new(InMemoryCapacityStore::new());
    let ledger = Arc::new(InMemoryReservationLedger::new());
    let audit_log = Arc::new(InMemoryAuditLog::new());
    let service = ReservationService::new(capacity_store.clone(), ledger, audit_log.clone());
    (service, capacity_store, audit_log)
}

async fn seed_concert(capacity_store: &InMemoryCapacityStore, total_seats: u32) -> ConcertId {
    let concert = Concert::new("The Gig", "", "Main Hall", Utc::now(), total_seats)
        .unwrap_or_else(|_| unreachable!());
    let concert_id = concert.id();
    assert!(capacity_store.create_concert(concert).await.is_ok());
    concert_id
}

#[tokio::test(flavor = "multi_thread")]
async fn racing_reserves_never_oversell_a_small_concert() {
    let (service, capacity_store, audit_log) = build_service();
    let total_seats = 5u32;
    let racers = 16u32;
    let concert_id = seed_concert(&capacity_store, total_seats).await;

    let mut handles = Vec::new();
    for index in 0..racers {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .reserve(
                    Username::new(format!("user-{index}")).unwrap_or_else(|_| unreachable!()),
                    concert_id,
                )
                .await
        }));
    }

    let mut successes = 0u32;
    let mut sold_out = 0u32;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => successes += 1,
            Ok(Err(AppError::SoldOut(_))) => sold_out += 1,
            Ok(Err(other)) => panic!("unexpected reserve failure: {other}"),
            Err(join_error) => panic!("reserve task panicked: {join_error}"),
        }
    }

    assert_eq!(successes, total_seats);
    assert_eq!(sold_out, racers - total_seats);

    let stored = capacity_store
        .find_concert(concert_id)
        .await
        .unwrap_or_default();
    let stored = stored.unwrap_or_else(|| unreachable!());
    assert_eq!(stored.reserved_seats(), total_seats);
    assert_eq!(stored.status(), ConcertStatus::SoldOut);

    // One audit entry per accepted reservation, none for the refused ones.
    let entries = audit_log.list_recent(100).await.unwrap_or_default();
    assert_eq!(entries.len(), total_seats as usize);
}

#[tokio::test(flavor = "multi_thread")]
async fn racing_reserves_from_one_user_grant_exactly_one_seat() {
    let (service, capacity_store, _) = build_service();
    let concert_id = seed_concert(&capacity_store, 10).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.reserve(username("alice"), concert_id).await
        }));
    }

    let mut successes = 0u32;
    let mut duplicates = 0u32;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => successes += 1,
            Ok(Err(AppError::DuplicateActive(_))) => duplicates += 1,
            Ok(Err(other)) => panic!("unexpected reserve failure: {other}"),
            Err(join_error) => panic!("reserve task panicked: {join_error}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(duplicates, 1);

    let stored = capacity_store
        .find_concert(concert_id)
        .await
        .unwrap_or_default();
    assert!(stored.is_some_and(|concert| concert.reserved_seats() == 1));
}

#[tokio::test(flavor = "multi_thread")]
async fn interleaved_reserves_and_cancels_keep_the_books_balanced() {
    let (service, capacity_store, audit_log) = build_service();
    let concert_id = seed_concert(&capacity_store, 3).await;

    // Fill the concert, then release and re-take seats from other users.
    let mut holders = Vec::new();
    for index in 0..3 {
        let outcome = service
            .reserve(
                Username::new(format!("holder-{index}")).unwrap_or_else(|_| unreachable!()),
                concert_id,
            )
            .await;
        holders.push(outcome.unwrap_or_else(|_| unreachable!()));
    }

    let mut handles = Vec::new();
    for (index, outcome) in holders.into_iter().enumerate() {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let owner = Username::new(format!("holder-{index}")).unwrap_or_else(|_| unreachable!());
            service.cancel(outcome.reservation.id(), &owner).await.map(|_| ())
        }));
    }
    for index in 0..3 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .reserve(
                    Username::new(format!("taker-{index}")).unwrap_or_else(|_| unreachable!()),
                    concert_id,
                )
                .await
                .map(|_| ())
        }));
    }

    for handle in handles {
        // Takers may race ahead of the releases and see SoldOut; nothing
        // else is acceptable.
        match handle.await {
            Ok(Ok(())) | Ok(Err(AppError::SoldOut(_))) => {}
            Ok(Err(other)) => panic!("unexpected failure: {other}"),
            Err(join_error) => panic!("task panicked: {join_error}"),
        }
    }

    let stored = capacity_store
        .find_concert(concert_id)
        .await
        .unwrap_or_default();
    let stored = stored.unwrap_or_else(|| unreachable!());
    assert!(stored.reserved_seats() <= stored.total_seats());

    // Every successful mutation left exactly one audit entry.
    let entries = audit_log.list_recent(100).await.unwrap_or_default();
    let cancels = entries
        .iter()
        .filter(|entry| entry.action() == encore_domain::AuditAction::Cancel)
        .count();
    let reserves = entries
        .iter()
        .filter(|entry| entry.action() == encore_domain::AuditAction::Reserve)
        .count();
    assert_eq!(cancels, 3);
    assert_eq!(stored.reserved_seats() as usize, reserves - cancels);
}
