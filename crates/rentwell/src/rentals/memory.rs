use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::domain::{
    LeaseId, LeaseStatus, ListingId, MaintenanceRequest, PaymentId, Property, PropertyId,
    PropertyStatus, RentPayment, RentalLease, RentalListing, RequestId, User, UserId, UserRole,
};
use super::store::{PaymentNotice, RentalStore, StoreError};

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    properties: HashMap<PropertyId, Property>,
    listings: HashMap<ListingId, RentalListing>,
    leases: HashMap<LeaseId, RentalLease>,
    lease_order: Vec<LeaseId>,
    payments: HashMap<PaymentId, RentPayment>,
    maintenance: HashMap<RequestId, MaintenanceRequest>,
    maintenance_order: Vec<RequestId>,
    fail_next_activation: bool,
}

/// Reference store backed by a single mutex over the whole state, which makes
/// every multi-row operation naturally atomic. Used by the api service wiring,
/// the demo command, and the test suites.
#[derive(Default, Clone)]
pub struct InMemoryRentalStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryRentalStore {
    pub fn seed_user(&self, user: User) {
        let mut state = self.lock();
        state.users.insert(user.id.clone(), user);
    }

    pub fn seed_property(&self, property: Property) {
        let mut state = self.lock();
        state.properties.insert(property.id.clone(), property);
    }

    /// Fault injection: make the next `activate_lease` call fail before any of
    /// its writes land, proving to callers that activation is all-or-nothing.
    pub fn inject_activation_failure(&self) {
        self.lock().fail_next_activation = true;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("store mutex poisoned")
    }
}

fn notice_for(state: &StoreState, payment: &RentPayment) -> Result<PaymentNotice, StoreError> {
    let lease = state
        .leases
        .get(&payment.lease_id)
        .ok_or_else(|| StoreError::Unavailable("payment references a missing lease".to_string()))?;
    let tenant = state
        .users
        .get(&lease.tenant_id)
        .ok_or_else(|| StoreError::Unavailable("lease references a missing tenant".to_string()))?;
    let landlord = state
        .users
        .get(&lease.landlord_id)
        .ok_or_else(|| StoreError::Unavailable("lease references a missing landlord".to_string()))?;
    let listing = state
        .listings
        .get(&lease.listing_id)
        .ok_or_else(|| StoreError::Unavailable("lease references a missing listing".to_string()))?;
    let property = state.properties.get(&listing.property_id).ok_or_else(|| {
        StoreError::Unavailable("listing references a missing property".to_string())
    })?;

    Ok(PaymentNotice {
        payment: payment.clone(),
        tenant: tenant.clone(),
        landlord: landlord.clone(),
        property_address: format!("{}, {}", property.address, property.location),
    })
}

fn due_notices<F>(state: &StoreState, matches: F) -> Result<Vec<PaymentNotice>, StoreError>
where
    F: Fn(NaiveDate) -> bool,
{
    let mut due: Vec<&RentPayment> = state
        .payments
        .values()
        .filter(|payment| {
            payment.status == super::domain::PaymentStatus::Due && matches(payment.due_date)
        })
        .collect();
    due.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.0.cmp(&b.id.0)));
    due.into_iter()
        .map(|payment| notice_for(state, payment))
        .collect()
}

impl RentalStore for InMemoryRentalStore {
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.get(id).cloned())
    }

    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, StoreError> {
        Ok(self.lock().properties.get(id).cloned())
    }

    fn create_listing(&self, listing: RentalListing) -> Result<RentalListing, StoreError> {
        let mut state = self.lock();
        if !state.properties.contains_key(&listing.property_id) {
            return Err(StoreError::NotFound);
        }
        if state
            .listings
            .values()
            .any(|existing| existing.property_id == listing.property_id)
        {
            return Err(StoreError::Conflict(
                "A rental listing already exists for this property".to_string(),
            ));
        }

        let owner_id = state
            .properties
            .get(&listing.property_id)
            .map(|property| property.owner_id.clone())
            .ok_or(StoreError::NotFound)?;
        if let Some(property) = state.properties.get_mut(&listing.property_id) {
            property.is_for_rent = true;
        }
        if let Some(owner) = state.users.get_mut(&owner_id) {
            if owner.role == UserRole::User {
                owner.role = UserRole::Landlord;
            }
        }
        state.listings.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    fn fetch_listing(&self, id: &ListingId) -> Result<Option<RentalListing>, StoreError> {
        Ok(self.lock().listings.get(id).cloned())
    }

    fn listing_for_property(&self, id: &PropertyId) -> Result<Option<RentalListing>, StoreError> {
        Ok(self
            .lock()
            .listings
            .values()
            .find(|listing| listing.property_id == *id)
            .cloned())
    }

    fn update_listing(&self, listing: RentalListing) -> Result<RentalListing, StoreError> {
        let mut state = self.lock();
        if !state.listings.contains_key(&listing.id) {
            return Err(StoreError::NotFound);
        }
        state.listings.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    fn insert_lease(&self, lease: RentalLease) -> Result<RentalLease, StoreError> {
        let mut state = self.lock();
        if state.leases.contains_key(&lease.id) {
            return Err(StoreError::Conflict("lease already exists".to_string()));
        }
        state.lease_order.push(lease.id.clone());
        state.leases.insert(lease.id.clone(), lease.clone());
        Ok(lease)
    }

    fn fetch_lease(&self, id: &LeaseId) -> Result<Option<RentalLease>, StoreError> {
        Ok(self.lock().leases.get(id).cloned())
    }

    fn leases_by_landlord(
        &self,
        landlord: &UserId,
        status: Option<LeaseStatus>,
    ) -> Result<Vec<RentalLease>, StoreError> {
        let state = self.lock();
        Ok(state
            .lease_order
            .iter()
            .rev()
            .filter_map(|id| state.leases.get(id))
            .filter(|lease| lease.landlord_id == *landlord)
            .filter(|lease| status.map_or(true, |wanted| lease.status == wanted))
            .cloned()
            .collect())
    }

    fn leases_by_tenant(
        &self,
        tenant: &UserId,
        status: Option<LeaseStatus>,
    ) -> Result<Vec<RentalLease>, StoreError> {
        let state = self.lock();
        Ok(state
            .lease_order
            .iter()
            .rev()
            .filter_map(|id| state.leases.get(id))
            .filter(|lease| lease.tenant_id == *tenant)
            .filter(|lease| status.map_or(true, |wanted| lease.status == wanted))
            .cloned()
            .collect())
    }

    fn active_lease_for_listing(
        &self,
        listing: &ListingId,
    ) -> Result<Option<RentalLease>, StoreError> {
        Ok(self
            .lock()
            .leases
            .values()
            .find(|lease| lease.listing_id == *listing && lease.status == LeaseStatus::Active)
            .cloned())
    }

    fn update_lease_status(
        &self,
        id: &LeaseId,
        status: LeaseStatus,
    ) -> Result<RentalLease, StoreError> {
        let mut state = self.lock();
        let lease = state.leases.get_mut(id).ok_or(StoreError::NotFound)?;
        lease.status = status;
        Ok(lease.clone())
    }

    fn activate_lease(
        &self,
        id: &LeaseId,
        payments: Vec<RentPayment>,
    ) -> Result<RentalLease, StoreError> {
        let mut state = self.lock();

        let lease = state.leases.get(id).cloned().ok_or(StoreError::NotFound)?;
        if lease.status != LeaseStatus::Pending {
            return Err(StoreError::Conflict(format!(
                "Lease is no longer pending (currently {})",
                lease.status.label()
            )));
        }
        let listing = state
            .listings
            .get(&lease.listing_id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        if !state.properties.contains_key(&listing.property_id) {
            return Err(StoreError::NotFound);
        }

        if state.fail_next_activation {
            state.fail_next_activation = false;
            return Err(StoreError::Unavailable(
                "injected activation failure".to_string(),
            ));
        }

        // Validation done; every write below lands under the same lock.
        if let Some(stored) = state.leases.get_mut(id) {
            stored.status = LeaseStatus::Active;
        }
        if let Some(property) = state.properties.get_mut(&listing.property_id) {
            property.status = PropertyStatus::Rented;
        }
        for payment in payments {
            state.payments.insert(payment.id.clone(), payment);
        }

        state
            .leases
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn fetch_payment(&self, id: &PaymentId) -> Result<Option<RentPayment>, StoreError> {
        Ok(self.lock().payments.get(id).cloned())
    }

    fn payments_for_lease(&self, lease: &LeaseId) -> Result<Vec<RentPayment>, StoreError> {
        let state = self.lock();
        let mut payments: Vec<RentPayment> = state
            .payments
            .values()
            .filter(|payment| payment.lease_id == *lease)
            .cloned()
            .collect();
        payments.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(payments)
    }

    fn update_payment(&self, payment: RentPayment) -> Result<RentPayment, StoreError> {
        let mut state = self.lock();
        if !state.payments.contains_key(&payment.id) {
            return Err(StoreError::NotFound);
        }
        state.payments.insert(payment.id.clone(), payment.clone());
        Ok(payment)
    }

    fn due_payments_through(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PaymentNotice>, StoreError> {
        let state = self.lock();
        due_notices(&state, |due_date| due_date >= from && due_date <= to)
    }

    fn due_payments_before(&self, date: NaiveDate) -> Result<Vec<PaymentNotice>, StoreError> {
        let state = self.lock();
        due_notices(&state, |due_date| due_date < date)
    }

    fn insert_maintenance_request(
        &self,
        request: MaintenanceRequest,
    ) -> Result<MaintenanceRequest, StoreError> {
        let mut state = self.lock();
        state.maintenance_order.push(request.id.clone());
        state.maintenance.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch_maintenance_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<MaintenanceRequest>, StoreError> {
        Ok(self.lock().maintenance.get(id).cloned())
    }

    fn update_maintenance_request(
        &self,
        request: MaintenanceRequest,
    ) -> Result<MaintenanceRequest, StoreError> {
        let mut state = self.lock();
        if !state.maintenance.contains_key(&request.id) {
            return Err(StoreError::NotFound);
        }
        state.maintenance.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn maintenance_for_property(
        &self,
        property: &PropertyId,
    ) -> Result<Vec<MaintenanceRequest>, StoreError> {
        let state = self.lock();
        Ok(state
            .maintenance_order
            .iter()
            .rev()
            .filter_map(|id| state.maintenance.get(id))
            .filter(|request| request.property_id == *property)
            .cloned()
            .collect())
    }
}
