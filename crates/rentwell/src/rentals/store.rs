use chrono::NaiveDate;

use super::domain::{
    LeaseId, LeaseStatus, ListingId, MaintenanceRequest, PaymentId, Property, PropertyId,
    RentPayment, RentalLease, RentalListing, RequestId, User, UserId,
};

/// Payment row joined with the people and property behind it, shaped for
/// notification rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotice {
    pub payment: RentPayment,
    pub tenant: User,
    pub landlord: User,
    pub property_address: String,
}

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence abstraction for the rental marketplace.
///
/// Multi-row operations (`create_listing`, `activate_lease`) are required to
/// be atomic: either every write in the operation is applied or none is, and
/// readers never observe a partial state. `activate_lease` must additionally
/// re-verify the PENDING precondition inside its own transaction boundary so
/// two concurrent activations cannot both insert a schedule.
pub trait RentalStore: Send + Sync {
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;
    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError>;

    /// Insert a listing, flag its property as for-rent, and promote the owner
    /// from USER to LANDLORD, all in one transaction. Fails with `Conflict`
    /// when the property already has a listing.
    fn create_listing(&self, listing: RentalListing) -> Result<RentalListing, StoreError>;
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<RentalListing>, StoreError>;
    fn listing_for_property(&self, id: &PropertyId) -> Result<Option<RentalListing>, StoreError>;
    fn update_listing(&self, listing: RentalListing) -> Result<RentalListing, StoreError>;

    fn insert_lease(&self, lease: RentalLease) -> Result<RentalLease, StoreError>;
    fn fetch_lease(&self, id: &LeaseId) -> Result<Option<RentalLease>, StoreError>;
    /// Leases for a landlord, most recently created first.
    fn leases_by_landlord(
        &self,
        landlord: &UserId,
        status: Option<LeaseStatus>,
    ) -> Result<Vec<RentalLease>, StoreError>;
    /// Leases for a tenant, most recently created first.
    fn leases_by_tenant(
        &self,
        tenant: &UserId,
        status: Option<LeaseStatus>,
    ) -> Result<Vec<RentalLease>, StoreError>;
    fn active_lease_for_listing(
        &self,
        listing: &ListingId,
    ) -> Result<Option<RentalLease>, StoreError>;
    fn update_lease_status(
        &self,
        id: &LeaseId,
        status: LeaseStatus,
    ) -> Result<RentalLease, StoreError>;
    /// Atomically mark the lease ACTIVE, flip its property to RENTED, and
    /// bulk-insert the payment schedule. Fails with `Conflict` when the lease
    /// is no longer PENDING at commit time.
    fn activate_lease(
        &self,
        id: &LeaseId,
        payments: Vec<RentPayment>,
    ) -> Result<RentalLease, StoreError>;

    fn fetch_payment(&self, id: &PaymentId) -> Result<Option<RentPayment>, StoreError>;
    /// All payments of a lease, due date ascending.
    fn payments_for_lease(&self, lease: &LeaseId) -> Result<Vec<RentPayment>, StoreError>;
    fn update_payment(&self, payment: RentPayment) -> Result<RentPayment, StoreError>;
    /// DUE payments with a due date inside `[from, to]`, due date ascending,
    /// joined with contact details.
    fn due_payments_through(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PaymentNotice>, StoreError>;
    /// DUE payments strictly before `date`, due date ascending, joined with
    /// contact details.
    fn due_payments_before(&self, date: NaiveDate) -> Result<Vec<PaymentNotice>, StoreError>;

    fn insert_maintenance_request(
        &self,
        request: MaintenanceRequest,
    ) -> Result<MaintenanceRequest, StoreError>;
    fn fetch_maintenance_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<MaintenanceRequest>, StoreError>;
    fn update_maintenance_request(
        &self,
        request: MaintenanceRequest,
    ) -> Result<MaintenanceRequest, StoreError>;
    fn maintenance_for_property(
        &self,
        property: &PropertyId,
    ) -> Result<Vec<MaintenanceRequest>, StoreError>;
}

/// Business error taxonomy surfaced by the rental services. Every failure of a
/// malformed or unauthorized request maps to one of the first three kinds;
/// `Store` covers infrastructure failures only.
#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RentalError {
    fn from(value: StoreError) -> Self {
        match value {
            // A conflict out of the store is a business invariant re-checked at
            // the transaction boundary, not an infrastructure fault.
            StoreError::Conflict(message) => RentalError::BadRequest(message),
            other => RentalError::Store(other),
        }
    }
}
