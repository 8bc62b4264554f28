use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::domain::{EscalationPolicy, ListingId, PropertyId, RentalListing, UserId};
use super::store::{RentalError, RentalStore};

static LISTING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_listing_id() -> ListingId {
    let id = LISTING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ListingId(format!("listing-{id:06}"))
}

/// Request payload for putting a property on the rental market.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub property_id: PropertyId,
    pub monthly_rent: Decimal,
    pub security_deposit: Decimal,
    pub available_from: NaiveDate,
    pub lease_duration_months: u32,
    pub escalation: Option<EscalationPolicy>,
}

/// Partial update applied to an existing listing. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct ListingUpdate {
    pub monthly_rent: Option<Decimal>,
    pub security_deposit: Option<Decimal>,
    pub available_from: Option<NaiveDate>,
    pub lease_duration_months: Option<u32>,
    pub is_active: Option<bool>,
    pub escalation_enabled: Option<bool>,
    pub escalation_percentage: Option<Decimal>,
    pub escalation_interval_months: Option<u32>,
}

/// CRUD over rent-eligible property listings, including ownership of the
/// escalation configuration consumed later by schedule generation.
pub struct ListingService<S> {
    store: Arc<S>,
}

impl<S> Clone for ListingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: RentalStore> ListingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Opt a property into the rental market. The store commits the listing
    /// insert, the property's for-rent flag, and the owner's USER -> LANDLORD
    /// promotion as one transaction.
    pub fn create(&self, actor: &UserId, request: NewListing) -> Result<RentalListing, RentalError> {
        let property = self
            .store
            .fetch_property(&request.property_id)?
            .ok_or(RentalError::NotFound("Property not found"))?;

        if property.owner_id != *actor {
            return Err(RentalError::Forbidden(
                "You can only create rental listings for your own properties",
            ));
        }

        if self
            .store
            .listing_for_property(&request.property_id)?
            .is_some()
        {
            return Err(RentalError::BadRequest(
                "A rental listing already exists for this property".to_string(),
            ));
        }

        if request.monthly_rent < Decimal::ZERO {
            return Err(RentalError::BadRequest(
                "Monthly rent cannot be negative".to_string(),
            ));
        }
        if request.security_deposit < Decimal::ZERO {
            return Err(RentalError::BadRequest(
                "Security deposit cannot be negative".to_string(),
            ));
        }
        if request.lease_duration_months == 0 {
            return Err(RentalError::BadRequest(
                "Lease duration must be at least one month".to_string(),
            ));
        }

        let escalation = request.escalation.unwrap_or_default();
        validate_escalation(&escalation)?;

        let listing = RentalListing {
            id: next_listing_id(),
            property_id: request.property_id,
            monthly_rent: request.monthly_rent,
            security_deposit: request.security_deposit,
            available_from: request.available_from,
            lease_duration_months: request.lease_duration_months,
            is_active: true,
            escalation,
        };

        Ok(self.store.create_listing(listing)?)
    }

    pub fn get(&self, id: &ListingId) -> Result<RentalListing, RentalError> {
        self.store
            .fetch_listing(id)?
            .ok_or(RentalError::NotFound("Rental listing not found"))
    }

    pub fn update(
        &self,
        id: &ListingId,
        actor: &UserId,
        update: ListingUpdate,
    ) -> Result<RentalListing, RentalError> {
        let mut listing = self.owned_listing(id, actor, "You can only update your own rental listings")?;

        if let Some(monthly_rent) = update.monthly_rent {
            if monthly_rent < Decimal::ZERO {
                return Err(RentalError::BadRequest(
                    "Monthly rent cannot be negative".to_string(),
                ));
            }
            listing.monthly_rent = monthly_rent;
        }
        if let Some(security_deposit) = update.security_deposit {
            if security_deposit < Decimal::ZERO {
                return Err(RentalError::BadRequest(
                    "Security deposit cannot be negative".to_string(),
                ));
            }
            listing.security_deposit = security_deposit;
        }
        if let Some(available_from) = update.available_from {
            listing.available_from = available_from;
        }
        if let Some(duration) = update.lease_duration_months {
            if duration == 0 {
                return Err(RentalError::BadRequest(
                    "Lease duration must be at least one month".to_string(),
                ));
            }
            listing.lease_duration_months = duration;
        }
        if let Some(is_active) = update.is_active {
            listing.is_active = is_active;
        }
        if let Some(enabled) = update.escalation_enabled {
            listing.escalation.enabled = enabled;
        }
        if let Some(percentage) = update.escalation_percentage {
            listing.escalation.percentage = percentage;
        }
        if let Some(interval) = update.escalation_interval_months {
            listing.escalation.interval_months = interval;
        }
        validate_escalation(&listing.escalation)?;

        Ok(self.store.update_listing(listing)?)
    }

    /// Soft delete: listings are never physically removed so lease history
    /// stays intact.
    pub fn remove(&self, id: &ListingId, actor: &UserId) -> Result<RentalListing, RentalError> {
        let mut listing =
            self.owned_listing(id, actor, "You can only delete your own rental listings")?;
        listing.is_active = false;
        Ok(self.store.update_listing(listing)?)
    }

    fn owned_listing(
        &self,
        id: &ListingId,
        actor: &UserId,
        denial: &'static str,
    ) -> Result<RentalListing, RentalError> {
        let listing = self
            .store
            .fetch_listing(id)?
            .ok_or(RentalError::NotFound("Rental listing not found"))?;
        let property = self
            .store
            .fetch_property(&listing.property_id)?
            .ok_or(RentalError::NotFound("Property not found"))?;
        if property.owner_id != *actor {
            return Err(RentalError::Forbidden(denial));
        }
        Ok(listing)
    }
}

fn validate_escalation(policy: &EscalationPolicy) -> Result<(), RentalError> {
    if policy.percentage < Decimal::ZERO {
        return Err(RentalError::BadRequest(
            "Escalation percentage cannot be negative".to_string(),
        ));
    }
    if policy.interval_months == 0 {
        return Err(RentalError::BadRequest(
            "Escalation interval must be at least one month".to_string(),
        ));
    }
    Ok(())
}
