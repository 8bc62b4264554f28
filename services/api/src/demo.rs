use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use rust_decimal_macros::dec;
use std::sync::Arc;

use rentwell::error::AppError;
use rentwell::rentals::domain::{
    EscalationPolicy, LeaseStatus, PaymentMethod, PropertyId, UserId,
};
use rentwell::rentals::leases::LeaseRequest;
use rentwell::rentals::listings::NewListing;
use rentwell::rentals::memory::InMemoryRentalStore;
use rentwell::rentals::router::RentalApi;

use crate::infra::{parse_date, seed_demo_data, TracingMailer};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Lease start date (YYYY-MM-DD). Defaults to the first of next month.
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Lease length in months.
    #[arg(long, default_value_t = 12)]
    pub(crate) months: u32,
    /// Annual escalation percentage applied to the listing.
    #[arg(long)]
    pub(crate) escalation_percent: Option<f64>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    let start = args.start_date.unwrap_or_else(|| first_of_next_month(today));
    let end = lease_end(start, args.months);

    let store = InMemoryRentalStore::default();
    seed_demo_data(&store);
    let api = RentalApi::new(Arc::new(store), Arc::new(TracingMailer), 3, None);

    let landlord = UserId("landlord-1".to_string());
    let tenant = UserId("tenant-1".to_string());

    println!("== Rentwell demo ==");

    let escalation = args.escalation_percent.map(|percent| EscalationPolicy {
        enabled: true,
        percentage: rust_decimal::Decimal::try_from(percent)
            .unwrap_or(rust_decimal::Decimal::ZERO),
        interval_months: 12,
    });

    let listing = api.listings.create(
        &landlord,
        NewListing {
            property_id: PropertyId("prop-1".to_string()),
            monthly_rent: dec!(1200),
            security_deposit: dec!(2400),
            available_from: start,
            lease_duration_months: args.months,
            escalation,
        },
    )?;
    println!(
        "listed property {} at {}/month (listing {})",
        listing.property_id.0, listing.monthly_rent, listing.id.0
    );

    let lease = api.leases.create(
        &tenant,
        LeaseRequest {
            listing_id: listing.id.clone(),
            start_date: start,
            end_date: end,
            payment_day: 1,
            notes: Some("Demo lease".to_string()),
        },
    )?;
    println!(
        "tenant {} requested lease {} ({} -> {})",
        lease.tenant_id.0, lease.id.0, lease.start_date, lease.end_date
    );

    let lease = api
        .leases
        .update_status(&lease.id, &landlord, LeaseStatus::Active)?;
    println!("landlord activated lease {}", lease.id.0);

    let payments = api.payments.list_for_lease(&lease.id, &tenant)?;
    println!("generated {} scheduled payments:", payments.len());
    for payment in &payments {
        println!("  {}  {:>10}  {}", payment.due_date, payment.amount, payment.status.label());
    }

    if let Some(first) = payments.first() {
        let paid = api.payments.mark_paid(
            &first.id,
            &tenant,
            PaymentMethod::BankTransfer,
            Some("First month".to_string()),
            first.due_date,
        )?;
        println!(
            "recorded payment {} of {} via {:?}",
            paid.id.0,
            paid.amount,
            paid.payment_method.unwrap_or(PaymentMethod::Other)
        );
    }

    if let Some(second) = payments.get(1) {
        let waived = api.payments.waive(&second.id, &landlord)?;
        println!("landlord waived payment {} due {}", waived.id.0, waived.due_date);
    }

    let detail = api.leases.get(&lease.id, &landlord)?;
    println!(
        "stats: {} paid ({}), {} due ({}), {} overdue, {} waived",
        detail.stats.paid_count,
        detail.stats.paid_total,
        detail.stats.due_count,
        detail.stats.due_total,
        detail.stats.overdue_count,
        detail.stats.waived_count
    );

    let report = api.scheduler.run_once(today)?;
    println!(
        "notification scan: {} upcoming ({} reminders sent), {} overdue ({} marked)",
        report.upcoming_found, report.reminders_sent, report.overdue_found, report.overdue_marked
    );

    Ok(())
}

fn first_of_next_month(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(today)
}

/// Last day of the term: `months` calendar months after `start`, minus one
/// day, so a start on the 1st yields exactly `months` monthly due dates.
fn lease_end(start: NaiveDate, months: u32) -> NaiveDate {
    let total = start.year() * 12 + start.month() as i32 - 1 + months as i32;
    let (year, month0) = (total.div_euclid(12), total.rem_euclid(12) as u32);
    let day = start.day().min(days_in_month(year, month0 + 1));
    NaiveDate::from_ymd_opt(year, month0 + 1, day)
        .and_then(|date| date.pred_opt())
        .unwrap_or(start)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
