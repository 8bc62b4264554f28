//! Rental marketplace engine: listings, the lease lifecycle state machine,
//! payment schedule generation, payment tracking, maintenance requests, and
//! the rent notification scheduler.
//!
//! Services are thin orchestration layers over the [`store::RentalStore`]
//! trait; the schedule generator in [`schedule`] is a pure function so the
//! date and money arithmetic stays independently testable.

pub mod domain;
pub mod leases;
pub mod listings;
pub mod maintenance;
pub mod memory;
pub mod payments;
pub mod router;
pub mod schedule;
pub mod scheduler;
pub mod store;

pub use domain::{
    EscalationPolicy, LeaseId, LeaseStatus, ListingId, MaintenancePriority, MaintenanceRequest,
    MaintenanceStatus, PaymentId, PaymentMethod, PaymentStatus, Property, PropertyId,
    PropertyStatus, RentPayment, RentalLease, RentalListing, RequestId, User, UserId, UserRole,
};
pub use leases::{LeaseDetail, LeaseRequest, LeaseService, LeaseSummary};
pub use listings::{ListingService, ListingUpdate, NewListing};
pub use maintenance::{MaintenanceService, NewMaintenanceRequest};
pub use memory::InMemoryRentalStore;
pub use payments::{PaymentService, PaymentStats};
pub use router::{rental_router, RentalApi};
pub use schedule::{generate_payment_schedule, PaymentObligation};
pub use scheduler::{
    MailError, NotificationRunReport, RentDueWarning, RentMailer, RentNotificationScheduler,
    RentOverdueNotice,
};
pub use store::{PaymentNotice, RentalError, RentalStore, StoreError};

#[cfg(test)]
mod tests;
