use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info};

use super::payments::PaymentService;
use super::store::{PaymentNotice, RentalError, RentalStore};

/// Reminder payload for a payment approaching its due date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentDueWarning {
    pub tenant_email: String,
    pub tenant_name: String,
    pub property_address: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub landlord_name: String,
    pub landlord_email: String,
}

impl RentDueWarning {
    fn from_notice(notice: &PaymentNotice) -> Self {
        Self {
            tenant_email: notice.tenant.email.clone(),
            tenant_name: notice.tenant.full_name(),
            property_address: notice.property_address.clone(),
            amount: notice.payment.amount,
            due_date: notice.payment.due_date,
            landlord_name: notice.landlord.full_name(),
            landlord_email: notice.landlord.email.clone(),
        }
    }
}

/// Escalated payload for a payment past its due date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentOverdueNotice {
    pub tenant_email: String,
    pub tenant_name: String,
    pub property_address: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub landlord_name: String,
    pub landlord_email: String,
}

/// Mail delivery error. Never propagated out of the scheduler batch.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Outbound mail boundary. Implementations are fire-and-forget from the
/// scheduler's perspective; delivery mechanics live outside this crate.
pub trait RentMailer: Send + Sync {
    fn send_rent_due_warning(&self, warning: &RentDueWarning) -> Result<(), MailError>;
    fn send_rent_overdue_notice(&self, notice: &RentOverdueNotice) -> Result<(), MailError>;
}

/// Counters describing one notification scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationRunReport {
    pub upcoming_found: usize,
    pub reminders_sent: usize,
    pub reminder_failures: usize,
    pub overdue_found: usize,
    pub overdue_marked: usize,
    pub overdue_notices_sent: usize,
    pub overdue_failures: usize,
}

/// Daily batch behind the external scheduler trigger: remind tenants of
/// payments inside the upcoming window, then mark lapsed DUE payments OVERDUE
/// and notify. A failure on one payment is logged and the batch continues;
/// only the underlying store queries propagate errors.
pub struct RentNotificationScheduler<S, M> {
    payments: PaymentService<S>,
    mailer: Arc<M>,
    upcoming_window_days: u32,
}

impl<S, M> RentNotificationScheduler<S, M>
where
    S: RentalStore,
    M: RentMailer,
{
    pub fn new(payments: PaymentService<S>, mailer: Arc<M>, upcoming_window_days: u32) -> Self {
        Self {
            payments,
            mailer,
            upcoming_window_days,
        }
    }

    pub fn run_once(&self, today: NaiveDate) -> Result<NotificationRunReport, RentalError> {
        info!(%today, "starting rent notification scan");
        let mut report = NotificationRunReport::default();

        let upcoming = self.payments.upcoming(today, self.upcoming_window_days)?;
        report.upcoming_found = upcoming.len();
        info!(
            count = upcoming.len(),
            window_days = self.upcoming_window_days,
            "found upcoming payments"
        );

        for notice in &upcoming {
            let warning = RentDueWarning::from_notice(notice);
            match self.mailer.send_rent_due_warning(&warning) {
                Ok(()) => {
                    info!(payment = %notice.payment.id.0, tenant = %warning.tenant_email, "sent rent due reminder");
                    report.reminders_sent += 1;
                }
                Err(err) => {
                    error!(payment = %notice.payment.id.0, %err, "failed to send rent due reminder");
                    report.reminder_failures += 1;
                }
            }
        }

        let overdue = self.payments.overdue(today)?;
        report.overdue_found = overdue.len();
        info!(count = overdue.len(), "found overdue payments");

        for notice in &overdue {
            if let Err(err) = self.payments.mark_overdue(&notice.payment.id) {
                error!(payment = %notice.payment.id.0, %err, "failed to mark payment overdue");
                report.overdue_failures += 1;
                continue;
            }
            report.overdue_marked += 1;

            let warning = RentDueWarning::from_notice(notice);
            let overdue_notice = RentOverdueNotice {
                days_overdue: (today - notice.payment.due_date).num_days(),
                tenant_email: warning.tenant_email,
                tenant_name: warning.tenant_name,
                property_address: warning.property_address,
                amount: warning.amount,
                due_date: warning.due_date,
                landlord_name: warning.landlord_name,
                landlord_email: warning.landlord_email,
            };
            match self.mailer.send_rent_overdue_notice(&overdue_notice) {
                Ok(()) => {
                    info!(payment = %notice.payment.id.0, days_overdue = overdue_notice.days_overdue, "sent overdue notification");
                    report.overdue_notices_sent += 1;
                }
                Err(err) => {
                    error!(payment = %notice.payment.id.0, %err, "failed to send overdue notification");
                    report.overdue_failures += 1;
                }
            }
        }

        info!(?report, "rent notification scan completed");
        Ok(report)
    }
}
