use rust_decimal_macros::dec;

use super::common::*;
use crate::rentals::domain::{LeaseStatus, PaymentStatus, PropertyStatus, UserId};
use crate::rentals::leases::LeaseRequest;
use crate::rentals::listings::ListingUpdate;
use crate::rentals::store::{RentalError, RentalStore};

#[test]
fn tenant_creates_pending_lease_with_listing_snapshots() {
    let services = build_services();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");

    let lease = services
        .leases
        .create(&tenant_id(), lease_request(&listing))
        .expect("lease created");

    assert_eq!(lease.status, LeaseStatus::Pending);
    assert_eq!(lease.landlord_id, landlord_id());
    assert_eq!(lease.tenant_id, tenant_id());
    assert_eq!(lease.monthly_rent, dec!(1200));
    assert_eq!(lease.security_deposit, dec!(2400));
}

#[test]
fn lease_snapshot_survives_later_listing_edits() {
    let services = build_services();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");
    let lease = services
        .leases
        .create(&tenant_id(), lease_request(&listing))
        .expect("lease created");

    services
        .listings
        .update(
            &listing.id,
            &landlord_id(),
            ListingUpdate {
                monthly_rent: Some(dec!(9999)),
                ..ListingUpdate::default()
            },
        )
        .expect("listing updated");

    let stored = services
        .store
        .fetch_lease(&lease.id)
        .expect("store reachable")
        .expect("lease exists");
    assert_eq!(stored.monthly_rent, dec!(1200));
}

#[test]
fn owner_cannot_rent_their_own_property() {
    let services = build_services();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");

    let err = services
        .leases
        .create(&landlord_id(), lease_request(&listing))
        .expect_err("self-rent rejected");
    assert!(matches!(
        err,
        RentalError::Forbidden("You cannot rent your own property")
    ));
}

#[test]
fn inactive_listing_rejects_new_leases() {
    let services = build_services();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");
    services
        .listings
        .remove(&listing.id, &landlord_id())
        .expect("listing removed");

    let err = services
        .leases
        .create(&tenant_id(), lease_request(&listing))
        .expect_err("inactive listing rejected");
    assert!(matches!(err, RentalError::BadRequest(msg) if msg == "This listing is no longer active"));
}

#[test]
fn lease_dates_and_payment_day_are_validated() {
    let services = build_services();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");

    let mut backwards = lease_request(&listing);
    backwards.end_date = backwards.start_date;
    let err = services
        .leases
        .create(&tenant_id(), backwards)
        .expect_err("equal dates rejected");
    assert!(matches!(err, RentalError::BadRequest(msg) if msg == "End date must be after start date"));

    let mut bad_day = lease_request(&listing);
    bad_day.payment_day = 32;
    let err = services
        .leases
        .create(&tenant_id(), bad_day)
        .expect_err("day out of range rejected");
    assert!(matches!(err, RentalError::BadRequest(msg) if msg == "Payment day must be between 1 and 31"));
}

#[test]
fn activation_inserts_schedule_and_flips_property_status() {
    let services = build_services();
    let lease = activated_lease(&services);

    assert_eq!(lease.status, LeaseStatus::Active);

    let payments = services
        .store
        .payments_for_lease(&lease.id)
        .expect("store reachable");
    assert_eq!(payments.len(), 12);
    assert!(payments
        .iter()
        .all(|payment| payment.status == PaymentStatus::Due));
    assert_eq!(payments[0].due_date, date(2024, 1, 1));

    let property = services
        .store
        .fetch_property(&property_id())
        .expect("store reachable")
        .expect("property exists");
    assert_eq!(property.status, PropertyStatus::Rented);
}

#[test]
fn only_the_landlord_may_drive_the_state_machine() {
    let services = build_services();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");
    let lease = services
        .leases
        .create(&tenant_id(), lease_request(&listing))
        .expect("lease created");

    let err = services
        .leases
        .update_status(&lease.id, &tenant_id(), LeaseStatus::Active)
        .expect_err("tenant cannot activate");
    assert!(matches!(
        err,
        RentalError::Forbidden("Only the landlord can update lease status")
    ));
}

#[test]
fn transition_table_is_enforced_exhaustively() {
    let all = [
        LeaseStatus::Pending,
        LeaseStatus::Active,
        LeaseStatus::Completed,
        LeaseStatus::Terminated,
        LeaseStatus::Canceled,
    ];

    for from in all {
        for to in all {
            let allowed = matches!(
                (from, to),
                (LeaseStatus::Pending, LeaseStatus::Active)
                    | (LeaseStatus::Pending, LeaseStatus::Canceled)
                    | (LeaseStatus::Active, LeaseStatus::Completed)
                    | (LeaseStatus::Active, LeaseStatus::Terminated)
            );
            assert_eq!(
                from.can_transition_to(to),
                allowed,
                "transition {} -> {}",
                from.label(),
                to.label()
            );
        }
    }
}

#[test]
fn illegal_transition_reports_both_states() {
    let services = build_services();
    let lease = activated_lease(&services);

    let err = services
        .leases
        .update_status(&lease.id, &landlord_id(), LeaseStatus::Active)
        .expect_err("active to active rejected");
    assert!(
        matches!(err, RentalError::BadRequest(msg) if msg == "Invalid status transition from ACTIVE to ACTIVE")
    );
}

#[test]
fn pending_lease_can_be_canceled_without_side_effects() {
    let services = build_services();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");
    let lease = services
        .leases
        .create(&tenant_id(), lease_request(&listing))
        .expect("lease created");

    let canceled = services
        .leases
        .update_status(&lease.id, &landlord_id(), LeaseStatus::Canceled)
        .expect("cancellation allowed");
    assert_eq!(canceled.status, LeaseStatus::Canceled);

    let payments = services
        .store
        .payments_for_lease(&lease.id)
        .expect("store reachable");
    assert!(payments.is_empty());

    let property = services
        .store
        .fetch_property(&property_id())
        .expect("store reachable")
        .expect("property exists");
    assert_eq!(property.status, PropertyStatus::Available);
}

#[test]
fn second_activation_attempt_fails_without_a_second_schedule() {
    let services = build_services();
    let lease = activated_lease(&services);
    let before = services
        .store
        .payments_for_lease(&lease.id)
        .expect("store reachable")
        .len();

    let err = services
        .leases
        .update_status(&lease.id, &landlord_id(), LeaseStatus::Active)
        .expect_err("double activation rejected");
    assert!(matches!(err, RentalError::BadRequest(_)));

    let after = services
        .store
        .payments_for_lease(&lease.id)
        .expect("store reachable")
        .len();
    assert_eq!(before, after);
}

#[test]
fn failed_activation_leaves_no_partial_state() {
    let services = build_services();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");
    let lease = services
        .leases
        .create(&tenant_id(), lease_request(&listing))
        .expect("lease created");

    services.store.inject_activation_failure();
    let err = services
        .leases
        .update_status(&lease.id, &landlord_id(), LeaseStatus::Active)
        .expect_err("injected failure surfaces");
    assert!(matches!(err, RentalError::Store(_)));

    let stored = services
        .store
        .fetch_lease(&lease.id)
        .expect("store reachable")
        .expect("lease exists");
    assert_eq!(stored.status, LeaseStatus::Pending);
    assert!(services
        .store
        .payments_for_lease(&lease.id)
        .expect("store reachable")
        .is_empty());
    let property = services
        .store
        .fetch_property(&property_id())
        .expect("store reachable")
        .expect("property exists");
    assert_eq!(property.status, PropertyStatus::Available);

    // The fault is one-shot; a retry goes through cleanly.
    let activated = services
        .leases
        .update_status(&lease.id, &landlord_id(), LeaseStatus::Active)
        .expect("retry succeeds");
    assert_eq!(activated.status, LeaseStatus::Active);
}

#[test]
fn active_listing_blocks_overlapping_leases() {
    let services = build_services();
    let lease = activated_lease(&services);
    let listing_id = lease.listing_id.clone();

    let other_tenant = UserId("tenant-2".to_string());
    let listing = services
        .store
        .fetch_listing(&listing_id)
        .expect("store reachable")
        .expect("listing exists");
    let err = services
        .leases
        .create(
            &other_tenant,
            LeaseRequest {
                listing_id: listing.id,
                start_date: date(2025, 1, 1),
                end_date: date(2025, 12, 31),
                payment_day: 1,
                notes: None,
            },
        )
        .expect_err("occupied listing rejected");
    assert!(
        matches!(err, RentalError::BadRequest(msg) if msg == "An active lease already exists for this listing")
    );
}

#[test]
fn lease_detail_includes_payments_and_stats_for_parties_only() {
    let services = build_services();
    let lease = activated_lease(&services);

    let detail = services
        .leases
        .get(&lease.id, &tenant_id())
        .expect("tenant can view");
    assert_eq!(detail.payments.len(), 12);
    assert_eq!(detail.stats.total_payments, 12);
    assert_eq!(detail.stats.due_count, 12);
    assert_eq!(detail.stats.due_total, dec!(14400.00));

    let err = services
        .leases
        .get(&lease.id, &UserId("stranger".to_string()))
        .expect_err("stranger denied");
    assert!(matches!(err, RentalError::Forbidden("Access denied")));
}

#[test]
fn lease_listings_attach_the_next_unresolved_payment() {
    let services = build_services();
    let lease = activated_lease(&services);

    let rows = services
        .leases
        .list_for_landlord(&landlord_id(), None)
        .expect("landlord listing");
    assert_eq!(rows.len(), 1);
    let next = rows[0].next_payment.as_ref().expect("next payment present");
    assert_eq!(next.due_date, date(2024, 1, 1));

    let filtered = services
        .leases
        .list_for_tenant(&tenant_id(), Some(LeaseStatus::Pending))
        .expect("tenant filter");
    assert!(filtered.is_empty());

    let active = services
        .leases
        .list_for_tenant(&tenant_id(), Some(LeaseStatus::Active))
        .expect("tenant filter");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].lease.id, lease.id);
}
