use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{
    LeaseId, PaymentId, PaymentMethod, PaymentStatus, RentPayment, RentalLease, UserId,
};
use super::store::{PaymentNotice, RentalError, RentalStore};

static PAYMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_payment_id() -> PaymentId {
    let id = PAYMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PaymentId(format!("payment-{id:06}"))
}

/// Per-lease aggregate of payment amounts and counts grouped by status.
/// Monetary sums are rounded to two decimal places.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStats {
    pub paid_total: Decimal,
    pub paid_count: u32,
    pub due_total: Decimal,
    pub due_count: u32,
    pub overdue_total: Decimal,
    pub overdue_count: u32,
    pub waived_count: u32,
    pub total_payments: u32,
}

impl PaymentStats {
    pub fn summarize(payments: &[RentPayment]) -> Self {
        let mut paid_total = Decimal::ZERO;
        let mut paid_count = 0;
        let mut due_total = Decimal::ZERO;
        let mut due_count = 0;
        let mut overdue_total = Decimal::ZERO;
        let mut overdue_count = 0;
        let mut waived_count = 0;

        for payment in payments {
            match payment.status {
                PaymentStatus::Paid => {
                    paid_total += payment.amount;
                    paid_count += 1;
                }
                PaymentStatus::Due => {
                    due_total += payment.amount;
                    due_count += 1;
                }
                PaymentStatus::Overdue => {
                    overdue_total += payment.amount;
                    overdue_count += 1;
                }
                PaymentStatus::Waived => waived_count += 1,
            }
        }

        Self {
            paid_total: paid_total.round_dp(2),
            paid_count,
            due_total: due_total.round_dp(2),
            due_count,
            overdue_total: overdue_total.round_dp(2),
            overdue_count,
            waived_count,
            total_payments: payments.len() as u32,
        }
    }
}

/// Tracks the lifecycle of individual scheduled rent obligations and serves
/// the queries the notification scheduler is built on.
pub struct PaymentService<S> {
    store: Arc<S>,
}

impl<S> Clone for PaymentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: RentalStore> PaymentService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All payments of a lease, due date ascending. Landlord or tenant only.
    pub fn list_for_lease(
        &self,
        lease_id: &LeaseId,
        actor: &UserId,
    ) -> Result<Vec<RentPayment>, RentalError> {
        let lease = self
            .store
            .fetch_lease(lease_id)?
            .ok_or(RentalError::NotFound("Lease not found"))?;
        ensure_lease_party(&lease, actor)?;
        Ok(self.store.payments_for_lease(lease_id)?)
    }

    /// Record a collected payment. Paid and waived are terminal states, each
    /// with its own rejection message.
    pub fn mark_paid(
        &self,
        id: &PaymentId,
        actor: &UserId,
        method: PaymentMethod,
        notes: Option<String>,
        paid_on: NaiveDate,
    ) -> Result<RentPayment, RentalError> {
        let mut payment = self.fetch(id)?;
        let lease = self
            .store
            .fetch_lease(&payment.lease_id)?
            .ok_or(RentalError::NotFound("Lease not found"))?;
        ensure_lease_party(&lease, actor)?;

        match payment.status {
            PaymentStatus::Paid => {
                return Err(RentalError::BadRequest(
                    "Payment is already marked as paid".to_string(),
                ))
            }
            PaymentStatus::Waived => {
                return Err(RentalError::BadRequest(
                    "Payment has been waived".to_string(),
                ))
            }
            PaymentStatus::Due | PaymentStatus::Overdue => {}
        }

        payment.status = PaymentStatus::Paid;
        payment.paid_date = Some(paid_on);
        payment.payment_method = Some(method);
        payment.notes = notes;
        Ok(self.store.update_payment(payment)?)
    }

    /// Forgive an obligation without collecting it. Landlord only; a paid
    /// payment can no longer be waived and a waived one stays waived.
    pub fn waive(&self, id: &PaymentId, actor: &UserId) -> Result<RentPayment, RentalError> {
        let mut payment = self.fetch(id)?;
        let lease = self
            .store
            .fetch_lease(&payment.lease_id)?
            .ok_or(RentalError::NotFound("Lease not found"))?;
        if lease.landlord_id != *actor {
            return Err(RentalError::Forbidden(
                "Only the landlord can waive rent payments",
            ));
        }

        match payment.status {
            PaymentStatus::Paid => {
                return Err(RentalError::BadRequest(
                    "Cannot waive a payment that is paid".to_string(),
                ))
            }
            PaymentStatus::Waived => {
                return Err(RentalError::BadRequest(
                    "Payment is already waived".to_string(),
                ))
            }
            PaymentStatus::Due | PaymentStatus::Overdue => {}
        }

        payment.status = PaymentStatus::Waived;
        Ok(self.store.update_payment(payment)?)
    }

    /// Flip a DUE payment to OVERDUE. Invoked by the notification scheduler;
    /// actor checks happen at the transport layer via the scheduler credential.
    pub fn mark_overdue(&self, id: &PaymentId) -> Result<RentPayment, RentalError> {
        let mut payment = self.fetch(id)?;
        if payment.status != PaymentStatus::Due {
            return Err(RentalError::BadRequest(
                "Only DUE payments can be marked overdue".to_string(),
            ));
        }
        payment.status = PaymentStatus::Overdue;
        Ok(self.store.update_payment(payment)?)
    }

    /// DUE payments falling inside `[today, today + days_ahead]`, joined with
    /// the contacts a reminder needs.
    pub fn upcoming(
        &self,
        today: NaiveDate,
        days_ahead: u32,
    ) -> Result<Vec<PaymentNotice>, RentalError> {
        let horizon = today + Duration::days(i64::from(days_ahead));
        Ok(self.store.due_payments_through(today, horizon)?)
    }

    /// DUE payments whose due date has already passed.
    pub fn overdue(&self, today: NaiveDate) -> Result<Vec<PaymentNotice>, RentalError> {
        Ok(self.store.due_payments_before(today)?)
    }

    fn fetch(&self, id: &PaymentId) -> Result<RentPayment, RentalError> {
        self.store
            .fetch_payment(id)?
            .ok_or(RentalError::NotFound("Payment not found"))
    }
}

pub(crate) fn ensure_lease_party(lease: &RentalLease, actor: &UserId) -> Result<(), RentalError> {
    if lease.landlord_id != *actor && lease.tenant_id != *actor {
        return Err(RentalError::Forbidden("Access denied"));
    }
    Ok(())
}
