use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::rentals::domain::{
    EscalationPolicy, LeaseStatus, Property, PropertyId, PropertyStatus, RentalLease,
    RentalListing, User, UserId, UserRole,
};
use crate::rentals::leases::{LeaseRequest, LeaseService};
use crate::rentals::listings::{ListingService, NewListing};
use crate::rentals::maintenance::MaintenanceService;
use crate::rentals::memory::InMemoryRentalStore;
use crate::rentals::payments::PaymentService;
use crate::rentals::scheduler::{
    MailError, RentDueWarning, RentMailer, RentNotificationScheduler, RentOverdueNotice,
};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn landlord_id() -> UserId {
    UserId("landlord-1".to_string())
}

pub(super) fn tenant_id() -> UserId {
    UserId("tenant-1".to_string())
}

pub(super) fn property_id() -> PropertyId {
    PropertyId("prop-1".to_string())
}

pub(super) fn landlord() -> User {
    User {
        id: landlord_id(),
        email: "dana.owner@example.com".to_string(),
        first_name: "Dana".to_string(),
        last_name: "Owner".to_string(),
        role: UserRole::Landlord,
    }
}

pub(super) fn tenant() -> User {
    User {
        id: tenant_id(),
        email: "theo.renter@example.com".to_string(),
        first_name: "Theo".to_string(),
        last_name: "Renter".to_string(),
        role: UserRole::User,
    }
}

pub(super) fn property() -> Property {
    Property {
        id: property_id(),
        owner_id: landlord_id(),
        address: "12 Elm Street".to_string(),
        location: "Des Moines".to_string(),
        price: dec!(250000),
        status: PropertyStatus::Available,
        is_for_rent: false,
    }
}

pub(super) fn seeded_store() -> Arc<InMemoryRentalStore> {
    let store = InMemoryRentalStore::default();
    store.seed_user(landlord());
    store.seed_user(tenant());
    store.seed_property(property());
    Arc::new(store)
}

pub(super) fn new_listing() -> NewListing {
    NewListing {
        property_id: property_id(),
        monthly_rent: dec!(1200),
        security_deposit: dec!(2400),
        available_from: date(2024, 1, 1),
        lease_duration_months: 12,
        escalation: None,
    }
}

pub(super) fn escalating_listing(percentage: Decimal, interval_months: u32) -> NewListing {
    NewListing {
        escalation: Some(EscalationPolicy {
            enabled: true,
            percentage,
            interval_months,
        }),
        ..new_listing()
    }
}

pub(super) fn lease_request(listing: &RentalListing) -> LeaseRequest {
    LeaseRequest {
        listing_id: listing.id.clone(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        payment_day: 1,
        notes: None,
    }
}

pub(super) struct Services {
    pub(super) store: Arc<InMemoryRentalStore>,
    pub(super) listings: ListingService<InMemoryRentalStore>,
    pub(super) leases: LeaseService<InMemoryRentalStore>,
    pub(super) payments: PaymentService<InMemoryRentalStore>,
    pub(super) maintenance: MaintenanceService<InMemoryRentalStore>,
}

pub(super) fn build_services() -> Services {
    let store = seeded_store();
    Services {
        listings: ListingService::new(store.clone()),
        leases: LeaseService::new(store.clone()),
        payments: PaymentService::new(store.clone()),
        maintenance: MaintenanceService::new(store.clone()),
        store,
    }
}

/// Seeded store with a listing and an already activated lease, the common
/// starting point for payment and scheduler tests.
pub(super) fn activated_lease(services: &Services) -> RentalLease {
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");
    let lease = services
        .leases
        .create(&tenant_id(), lease_request(&listing))
        .expect("lease created");
    services
        .leases
        .update_status(&lease.id, &landlord_id(), LeaseStatus::Active)
        .expect("lease activated")
}

#[derive(Default)]
pub(super) struct MemoryMailer {
    pub(super) warnings: Mutex<Vec<RentDueWarning>>,
    pub(super) overdue: Mutex<Vec<RentOverdueNotice>>,
}

impl MemoryMailer {
    pub(super) fn warnings(&self) -> Vec<RentDueWarning> {
        self.warnings.lock().expect("mailer mutex poisoned").clone()
    }

    pub(super) fn overdue(&self) -> Vec<RentOverdueNotice> {
        self.overdue.lock().expect("mailer mutex poisoned").clone()
    }
}

impl RentMailer for MemoryMailer {
    fn send_rent_due_warning(&self, warning: &RentDueWarning) -> Result<(), MailError> {
        self.warnings
            .lock()
            .expect("mailer mutex poisoned")
            .push(warning.clone());
        Ok(())
    }

    fn send_rent_overdue_notice(&self, notice: &RentOverdueNotice) -> Result<(), MailError> {
        self.overdue
            .lock()
            .expect("mailer mutex poisoned")
            .push(notice.clone());
        Ok(())
    }
}

/// Mailer whose transport always fails; batches must keep going anyway.
pub(super) struct BrokenMailer;

impl RentMailer for BrokenMailer {
    fn send_rent_due_warning(&self, _warning: &RentDueWarning) -> Result<(), MailError> {
        Err(MailError::Transport("smtp offline".to_string()))
    }

    fn send_rent_overdue_notice(&self, _notice: &RentOverdueNotice) -> Result<(), MailError> {
        Err(MailError::Transport("smtp offline".to_string()))
    }
}

pub(super) fn scheduler_with_mailer<M: RentMailer>(
    services: &Services,
    mailer: Arc<M>,
    window_days: u32,
) -> RentNotificationScheduler<InMemoryRentalStore, M> {
    RentNotificationScheduler::new(services.payments.clone(), mailer, window_days)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
