use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::domain::{
    MaintenancePriority, MaintenanceRequest, MaintenanceStatus, PropertyId, RequestId, UserId,
};
use super::store::{RentalError, RentalStore};

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("request-{id:06}"))
}

#[derive(Debug, Clone)]
pub struct NewMaintenanceRequest {
    pub property_id: PropertyId,
    pub title: String,
    pub description: String,
    pub priority: Option<MaintenancePriority>,
}

/// Repair requests against a property, filed by its owner or the tenant of an
/// active lease. Peripheral to the lease engine but part of the data model.
pub struct MaintenanceService<S> {
    store: Arc<S>,
}

impl<S> Clone for MaintenanceService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: RentalStore> MaintenanceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        actor: &UserId,
        request: NewMaintenanceRequest,
    ) -> Result<MaintenanceRequest, RentalError> {
        let property = self
            .store
            .fetch_property(&request.property_id)?
            .ok_or(RentalError::NotFound("Property not found"))?;

        let is_owner = property.owner_id == *actor;
        if !is_owner && !self.is_active_tenant(&request.property_id, actor)? {
            return Err(RentalError::Forbidden(
                "You can only create maintenance requests for properties you own or rent",
            ));
        }

        let record = MaintenanceRequest {
            id: next_request_id(),
            property_id: request.property_id,
            requested_by: actor.clone(),
            title: request.title,
            description: request.description,
            priority: request.priority.unwrap_or(MaintenancePriority::Medium),
            status: MaintenanceStatus::Open,
        };
        Ok(self.store.insert_maintenance_request(record)?)
    }

    /// Status updates are reserved for the property owner.
    pub fn update_status(
        &self,
        id: &RequestId,
        actor: &UserId,
        status: MaintenanceStatus,
    ) -> Result<MaintenanceRequest, RentalError> {
        let mut request = self
            .store
            .fetch_maintenance_request(id)?
            .ok_or(RentalError::NotFound("Maintenance request not found"))?;
        let property = self
            .store
            .fetch_property(&request.property_id)?
            .ok_or(RentalError::NotFound("Property not found"))?;
        if property.owner_id != *actor {
            return Err(RentalError::Forbidden(
                "Only the property owner can update maintenance requests",
            ));
        }

        request.status = status;
        Ok(self.store.update_maintenance_request(request)?)
    }

    pub fn list_for_property(
        &self,
        property_id: &PropertyId,
        actor: &UserId,
    ) -> Result<Vec<MaintenanceRequest>, RentalError> {
        let property = self
            .store
            .fetch_property(property_id)?
            .ok_or(RentalError::NotFound("Property not found"))?;

        let is_owner = property.owner_id == *actor;
        if !is_owner && !self.is_active_tenant(property_id, actor)? {
            return Err(RentalError::Forbidden("Access denied to this property"));
        }

        Ok(self.store.maintenance_for_property(property_id)?)
    }

    fn is_active_tenant(
        &self,
        property_id: &PropertyId,
        actor: &UserId,
    ) -> Result<bool, RentalError> {
        let Some(listing) = self.store.listing_for_property(property_id)? else {
            return Ok(false);
        };
        let Some(lease) = self.store.active_lease_for_listing(&listing.id)? else {
            return Ok(false);
        };
        Ok(lease.tenant_id == *actor)
    }
}
