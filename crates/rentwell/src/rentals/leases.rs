use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::domain::{
    LeaseId, LeaseStatus, ListingId, PaymentStatus, RentPayment, RentalLease, UserId,
};
use super::payments::{ensure_lease_party, next_payment_id, PaymentStats};
use super::schedule::generate_payment_schedule;
use super::store::{RentalError, RentalStore};

static LEASE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_lease_id() -> LeaseId {
    let id = LEASE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeaseId(format!("lease-{id:06}"))
}

/// Tenant-submitted request for a lease against a listing. The landlord is
/// always derived from the listing's property owner, never supplied here.
#[derive(Debug, Clone)]
pub struct LeaseRequest {
    pub listing_id: ListingId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_day: u32,
    pub notes: Option<String>,
}

/// Lease detail view: the lease, its full ordered schedule, and aggregate
/// payment statistics.
#[derive(Debug, Clone, Serialize)]
pub struct LeaseDetail {
    pub lease: RentalLease,
    pub payments: Vec<RentPayment>,
    pub stats: PaymentStats,
}

/// Dashboard row: a lease plus its earliest unresolved (due or overdue)
/// payment, when one exists.
#[derive(Debug, Clone, Serialize)]
pub struct LeaseSummary {
    pub lease: RentalLease,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_payment: Option<RentPayment>,
}

/// Validates lease creation preconditions, enforces the lease state machine,
/// and drives the transactional activation side effect.
pub struct LeaseService<S> {
    store: Arc<S>,
}

impl<S> Clone for LeaseService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: RentalStore> LeaseService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a PENDING lease on behalf of the requesting tenant, copying the
    /// listing's rent and deposit as immutable snapshots.
    pub fn create(&self, actor: &UserId, request: LeaseRequest) -> Result<RentalLease, RentalError> {
        let listing = self
            .store
            .fetch_listing(&request.listing_id)?
            .ok_or(RentalError::NotFound("Rental listing not found"))?;

        if !listing.is_active {
            return Err(RentalError::BadRequest(
                "This listing is no longer active".to_string(),
            ));
        }

        let property = self
            .store
            .fetch_property(&listing.property_id)?
            .ok_or(RentalError::NotFound("Property not found"))?;

        if property.owner_id == *actor {
            return Err(RentalError::Forbidden("You cannot rent your own property"));
        }

        if self
            .store
            .active_lease_for_listing(&listing.id)?
            .is_some()
        {
            return Err(RentalError::BadRequest(
                "An active lease already exists for this listing".to_string(),
            ));
        }

        if request.end_date <= request.start_date {
            return Err(RentalError::BadRequest(
                "End date must be after start date".to_string(),
            ));
        }

        if !(1..=31).contains(&request.payment_day) {
            return Err(RentalError::BadRequest(
                "Payment day must be between 1 and 31".to_string(),
            ));
        }

        let lease = RentalLease {
            id: next_lease_id(),
            listing_id: listing.id,
            landlord_id: property.owner_id,
            tenant_id: actor.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            monthly_rent: listing.monthly_rent,
            security_deposit: listing.security_deposit,
            payment_day: request.payment_day,
            status: LeaseStatus::Pending,
            notes: request.notes,
        };

        Ok(self.store.insert_lease(lease)?)
    }

    /// Drive the lease state machine. Only the landlord may change status;
    /// PENDING -> ACTIVE additionally triggers the transactional activation
    /// side effect, every other legal transition is a plain field update.
    pub fn update_status(
        &self,
        id: &LeaseId,
        actor: &UserId,
        target: LeaseStatus,
    ) -> Result<RentalLease, RentalError> {
        let lease = self
            .store
            .fetch_lease(id)?
            .ok_or(RentalError::NotFound("Lease not found"))?;

        if lease.landlord_id != *actor {
            return Err(RentalError::Forbidden(
                "Only the landlord can update lease status",
            ));
        }

        if !lease.status.can_transition_to(target) {
            return Err(RentalError::BadRequest(format!(
                "Invalid status transition from {} to {}",
                lease.status.label(),
                target.label()
            )));
        }

        if lease.status == LeaseStatus::Pending && target == LeaseStatus::Active {
            return self.activate(lease);
        }

        Ok(self.store.update_lease_status(id, target)?)
    }

    /// Lease detail with computed payment statistics. Restricted to the
    /// lease's landlord or tenant.
    pub fn get(&self, id: &LeaseId, actor: &UserId) -> Result<LeaseDetail, RentalError> {
        let lease = self
            .store
            .fetch_lease(id)?
            .ok_or(RentalError::NotFound("Lease not found"))?;
        ensure_lease_party(&lease, actor)?;

        let payments = self.store.payments_for_lease(id)?;
        let stats = PaymentStats::summarize(&payments);
        Ok(LeaseDetail {
            lease,
            payments,
            stats,
        })
    }

    pub fn list_for_landlord(
        &self,
        actor: &UserId,
        status: Option<LeaseStatus>,
    ) -> Result<Vec<LeaseSummary>, RentalError> {
        let leases = self.store.leases_by_landlord(actor, status)?;
        self.summarize(leases)
    }

    pub fn list_for_tenant(
        &self,
        actor: &UserId,
        status: Option<LeaseStatus>,
    ) -> Result<Vec<LeaseSummary>, RentalError> {
        let leases = self.store.leases_by_tenant(actor, status)?;
        self.summarize(leases)
    }

    /// Activation: regenerate the schedule from the lease and the listing's
    /// escalation policy, then hand the store one atomic commit covering the
    /// status flip, the property flip, and the schedule insert. The store
    /// re-verifies the PENDING precondition inside that boundary, so a
    /// concurrent activation that loses the race surfaces as a bad request
    /// rather than a second schedule.
    fn activate(&self, lease: RentalLease) -> Result<RentalLease, RentalError> {
        let listing = self
            .store
            .fetch_listing(&lease.listing_id)?
            .ok_or(RentalError::NotFound("Rental listing not found"))?;

        let payments: Vec<RentPayment> = generate_payment_schedule(&lease, &listing.escalation)
            .into_iter()
            .map(|obligation| RentPayment {
                id: next_payment_id(),
                lease_id: lease.id.clone(),
                amount: obligation.amount,
                due_date: obligation.due_date,
                paid_date: None,
                status: PaymentStatus::Due,
                payment_method: None,
                notes: None,
            })
            .collect();
        let scheduled = payments.len();

        let activated = self.store.activate_lease(&lease.id, payments)?;
        info!(lease = %activated.id.0, payments = scheduled, "lease activated with payment schedule");
        Ok(activated)
    }

    fn summarize(&self, leases: Vec<RentalLease>) -> Result<Vec<LeaseSummary>, RentalError> {
        leases
            .into_iter()
            .map(|lease| {
                let next_payment = self
                    .store
                    .payments_for_lease(&lease.id)?
                    .into_iter()
                    .find(|payment| {
                        matches!(payment.status, PaymentStatus::Due | PaymentStatus::Overdue)
                    });
                Ok(LeaseSummary {
                    lease,
                    next_payment,
                })
            })
            .collect()
    }
}
