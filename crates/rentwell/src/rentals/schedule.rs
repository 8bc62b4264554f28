use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::domain::{EscalationPolicy, RentalLease};

/// One entry of a generated payment schedule, before ids are minted and the
/// rows are persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentObligation {
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

/// Map a lease and its listing's escalation policy to the full ordered list of
/// rent obligations covering the lease term.
///
/// The schedule is computed once at activation and becomes the source of truth
/// for billing and notifications, so this is a pure function of its inputs: no
/// clock access, no stored state. The first due date is the lease start with
/// its day-of-month replaced by `payment_day`, pushed one month forward when
/// that would land before the lease starts. Escalation compounds
/// multiplicatively on the running rent whenever the whole-calendar-month
/// distance from the start crosses another interval; the day-of-month is
/// deliberately ignored in that distance, matching the billing anniversary
/// semantics of the rest of the system.
pub fn generate_payment_schedule(
    lease: &RentalLease,
    policy: &EscalationPolicy,
) -> Vec<PaymentObligation> {
    let mut schedule = Vec::new();
    let mut due = first_due_date(lease.start_date, lease.payment_day);
    let mut rent = lease.monthly_rent;
    let mut last_escalation_month: i32 = 0;
    let growth = Decimal::ONE + policy.percentage / Decimal::ONE_HUNDRED;

    while due <= lease.end_date {
        let elapsed = whole_months_between(lease.start_date, due);
        if policy.applies()
            && elapsed > 0
            && elapsed >= last_escalation_month + policy.interval_months as i32
        {
            rent *= growth;
            last_escalation_month = elapsed;
        }

        schedule.push(PaymentObligation {
            due_date: due,
            amount: rent.round_dp(2),
        });

        due = next_due_date(due, lease.payment_day);
    }

    schedule
}

/// Whole calendar months between two dates, day-of-month ignored.
pub(crate) fn whole_months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

fn first_due_date(start: NaiveDate, payment_day: u32) -> NaiveDate {
    let candidate = date_on_payment_day(start.year(), start.month(), payment_day);
    if candidate < start {
        let (year, month) = following_month(start.year(), start.month());
        date_on_payment_day(year, month, payment_day)
    } else {
        candidate
    }
}

/// Advance one calendar month, re-anchoring to the requested payment day so a
/// clamp in a short month (e.g. the 31st in February) does not stick.
fn next_due_date(current: NaiveDate, payment_day: u32) -> NaiveDate {
    let (year, month) = following_month(current.year(), current.month());
    date_on_payment_day(year, month, payment_day)
}

fn following_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn date_on_payment_day(year: i32, month: u32, payment_day: u32) -> NaiveDate {
    let day = payment_day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is valid for its month")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = following_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .expect("month has a final day")
}
