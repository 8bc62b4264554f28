use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal_macros::dec;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

use rentwell::rentals::domain::{
    Property, PropertyId, PropertyStatus, User, UserId, UserRole,
};
use rentwell::rentals::memory::InMemoryRentalStore;
use rentwell::rentals::scheduler::{
    MailError, RentDueWarning, RentMailer, RentOverdueNotice,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mailer used until a real transport is wired up: renders each notification
/// into the log stream so operators can see what would have been sent.
#[derive(Default, Clone)]
pub(crate) struct TracingMailer;

impl RentMailer for TracingMailer {
    fn send_rent_due_warning(&self, warning: &RentDueWarning) -> Result<(), MailError> {
        info!(
            to = %warning.tenant_email,
            amount = %warning.amount,
            due = %warning.due_date,
            address = %warning.property_address,
            "rent due reminder"
        );
        Ok(())
    }

    fn send_rent_overdue_notice(&self, notice: &RentOverdueNotice) -> Result<(), MailError> {
        info!(
            to = %notice.tenant_email,
            amount = %notice.amount,
            due = %notice.due_date,
            days_overdue = notice.days_overdue,
            address = %notice.property_address,
            "rent overdue notice"
        );
        Ok(())
    }
}

/// Accounts and properties available out of the box while the service runs
/// without a real user or property backend.
pub(crate) fn seed_demo_data(store: &InMemoryRentalStore) {
    store.seed_user(User {
        id: UserId("landlord-1".to_string()),
        email: "dana.owner@example.com".to_string(),
        first_name: "Dana".to_string(),
        last_name: "Owner".to_string(),
        role: UserRole::User,
    });
    store.seed_user(User {
        id: UserId("tenant-1".to_string()),
        email: "theo.renter@example.com".to_string(),
        first_name: "Theo".to_string(),
        last_name: "Renter".to_string(),
        role: UserRole::User,
    });
    store.seed_user(User {
        id: UserId("tenant-2".to_string()),
        email: "ida.applicant@example.com".to_string(),
        first_name: "Ida".to_string(),
        last_name: "Applicant".to_string(),
        role: UserRole::User,
    });
    store.seed_property(Property {
        id: PropertyId("prop-1".to_string()),
        owner_id: UserId("landlord-1".to_string()),
        address: "12 Elm Street".to_string(),
        location: "Des Moines".to_string(),
        price: dec!(250000),
        status: PropertyStatus::Available,
        is_for_rent: false,
    });
    store.seed_property(Property {
        id: PropertyId("prop-2".to_string()),
        owner_id: UserId("landlord-1".to_string()),
        address: "48 Maple Avenue".to_string(),
        location: "Cedar Rapids".to_string(),
        price: dec!(180000),
        status: PropertyStatus::Available,
        is_for_rent: false,
    });
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
