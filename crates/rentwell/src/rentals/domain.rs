use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier wrapper for rental listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Identifier wrapper for rental leases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(pub String);

/// Identifier wrapper for scheduled rent payments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

/// Identifier wrapper for maintenance requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Role attached to a user account. Listing a property for rent promotes a
/// baseline user to landlord; admins are never demoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    User,
    Landlord,
    Admin,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Landlord => "LANDLORD",
            UserRole::Admin => "ADMIN",
        }
    }
}

/// Account snapshot used for access checks and notification rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Lifecycle of a property across the sale and rental flows. The rental core
/// only ever performs the `Available` -> `Rented` flip during lease activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyStatus {
    Available,
    Sold,
    Rented,
}

/// Property referenced by listings and leases. Owned and mostly mutated by the
/// sale flow outside this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub owner_id: UserId,
    pub address: String,
    pub location: String,
    pub price: Decimal,
    pub status: PropertyStatus,
    pub is_for_rent: bool,
}

/// Periodic rent increase policy carried by a listing and applied while
/// generating a lease's payment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationPolicy {
    pub enabled: bool,
    /// Percentage increase per interval, e.g. 5.0 means +5%.
    pub percentage: Decimal,
    pub interval_months: u32,
}

impl EscalationPolicy {
    /// True when the policy is configured to produce any increase at all.
    pub fn applies(&self) -> bool {
        self.enabled && self.percentage > Decimal::ZERO && self.interval_months > 0
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            percentage: Decimal::ZERO,
            interval_months: 12,
        }
    }
}

/// Advertisement of a property on the rental market. At most one listing
/// exists per property; removal is a soft delete so lease history survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalListing {
    pub id: ListingId,
    pub property_id: PropertyId,
    pub monthly_rent: Decimal,
    pub security_deposit: Decimal,
    pub available_from: NaiveDate,
    pub lease_duration_months: u32,
    pub is_active: bool,
    pub escalation: EscalationPolicy,
}

/// Lease state machine. Completed, terminated, and canceled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseStatus {
    Pending,
    Active,
    Completed,
    Terminated,
    Canceled,
}

impl LeaseStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeaseStatus::Pending => "PENDING",
            LeaseStatus::Active => "ACTIVE",
            LeaseStatus::Completed => "COMPLETED",
            LeaseStatus::Terminated => "TERMINATED",
            LeaseStatus::Canceled => "CANCELED",
        }
    }

    /// The full transition table, kept in one place so call sites only ever
    /// perform a membership test.
    pub const fn allowed_transitions(self) -> &'static [LeaseStatus] {
        match self {
            LeaseStatus::Pending => &[LeaseStatus::Active, LeaseStatus::Canceled],
            LeaseStatus::Active => &[LeaseStatus::Completed, LeaseStatus::Terminated],
            LeaseStatus::Completed | LeaseStatus::Terminated | LeaseStatus::Canceled => &[],
        }
    }

    pub fn can_transition_to(self, next: LeaseStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

/// Binding agreement between landlord and tenant over a listing.
///
/// `monthly_rent` and `security_deposit` are snapshots copied from the listing
/// at creation time; later listing edits never affect an existing lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalLease {
    pub id: LeaseId,
    pub listing_id: ListingId,
    pub landlord_id: UserId,
    pub tenant_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent: Decimal,
    pub security_deposit: Decimal,
    /// Day of month the rent is due (1-31, clamped in short months).
    pub payment_day: u32,
    pub status: LeaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Status of a single scheduled rent obligation. Paid and waived are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Due,
    Paid,
    Overdue,
    Waived,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Due => "DUE",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Overdue => "OVERDUE",
            PaymentStatus::Waived => "WAIVED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Waived)
    }
}

/// How a collected payment was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Check,
    Other,
}

/// One scheduled rent charge for a single billing period within a lease.
/// Created in bulk at activation and mutated individually afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentPayment {
    pub id: PaymentId,
    pub lease_id: LeaseId,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
}

/// Repair request filed against a property by its owner or a current tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub property_id: PropertyId,
    pub requested_by: UserId,
    pub title: String,
    pub description: String,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
}
