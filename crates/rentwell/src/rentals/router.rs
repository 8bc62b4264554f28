use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    EscalationPolicy, LeaseId, LeaseStatus, ListingId, MaintenancePriority, MaintenanceStatus,
    PaymentId, PaymentMethod, PropertyId, RequestId, UserId,
};
use super::leases::{LeaseRequest, LeaseService};
use super::listings::{ListingService, ListingUpdate, NewListing};
use super::maintenance::{MaintenanceService, NewMaintenanceRequest};
use super::payments::PaymentService;
use super::scheduler::{RentMailer, RentNotificationScheduler};
use super::store::{RentalError, RentalStore};

/// Bundle of rental services shared as router state, plus the credential
/// guarding the internal scheduler endpoints.
pub struct RentalApi<S, M> {
    pub listings: ListingService<S>,
    pub leases: LeaseService<S>,
    pub payments: PaymentService<S>,
    pub maintenance: MaintenanceService<S>,
    pub scheduler: RentNotificationScheduler<S, M>,
    scheduler_token: Option<String>,
}

impl<S, M> RentalApi<S, M>
where
    S: RentalStore,
    M: RentMailer,
{
    pub fn new(
        store: Arc<S>,
        mailer: Arc<M>,
        upcoming_window_days: u32,
        scheduler_token: Option<String>,
    ) -> Self {
        let payments = PaymentService::new(store.clone());
        Self {
            listings: ListingService::new(store.clone()),
            leases: LeaseService::new(store.clone()),
            payments: payments.clone(),
            maintenance: MaintenanceService::new(store),
            scheduler: RentNotificationScheduler::new(payments, mailer, upcoming_window_days),
            scheduler_token,
        }
    }
}

impl IntoResponse for RentalError {
    fn into_response(self) -> Response {
        let status = match &self {
            RentalError::NotFound(_) => StatusCode::NOT_FOUND,
            RentalError::Forbidden(_) => StatusCode::FORBIDDEN,
            RentalError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RentalError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Router builder exposing the rental marketplace endpoints. Actor identity is
/// an explicit `x-user-id` header on every authenticated route; there is no
/// ambient session.
pub fn rental_router<S, M>(api: Arc<RentalApi<S, M>>) -> Router
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    Router::new()
        .route("/api/v1/rentals/listings", post(create_listing_handler::<S, M>))
        .route(
            "/api/v1/rentals/listings/:listing_id",
            get(get_listing_handler::<S, M>)
                .patch(update_listing_handler::<S, M>)
                .delete(delete_listing_handler::<S, M>),
        )
        .route(
            "/api/v1/rentals/leases",
            post(create_lease_handler::<S, M>).get(list_leases_handler::<S, M>),
        )
        .route("/api/v1/rentals/leases/:lease_id", get(get_lease_handler::<S, M>))
        .route(
            "/api/v1/rentals/leases/:lease_id/status",
            patch(update_lease_status_handler::<S, M>),
        )
        .route("/api/v1/rentals/payments", get(list_payments_handler::<S, M>))
        .route(
            "/api/v1/rentals/payments/:payment_id/pay",
            patch(pay_handler::<S, M>),
        )
        .route(
            "/api/v1/rentals/payments/:payment_id/waive",
            patch(waive_handler::<S, M>),
        )
        .route(
            "/api/v1/rentals/payments/:payment_id/mark-overdue",
            patch(mark_overdue_handler::<S, M>),
        )
        .route(
            "/api/v1/rentals/notifications/run",
            post(run_notifications_handler::<S, M>),
        )
        .route(
            "/api/v1/rentals/maintenance",
            post(create_maintenance_handler::<S, M>).get(list_maintenance_handler::<S, M>),
        )
        .route(
            "/api/v1/rentals/maintenance/:request_id/status",
            patch(update_maintenance_status_handler::<S, M>),
        )
        .with_state(api)
}

fn actor_id(headers: &HeaderMap) -> Result<UserId, Response> {
    match headers.get("x-user-id").and_then(|value| value.to_str().ok()) {
        Some(value) if !value.is_empty() => Ok(UserId(value.to_string())),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing x-user-id header" })),
        )
            .into_response()),
    }
}

/// The overdue flip and the notification scan are internal operations; when a
/// scheduler token is configured, callers must present it.
fn authorize_scheduler(expected: &Option<String>, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = headers
        .get("x-service-token")
        .and_then(|value| value.to_str().ok());
    if provided == Some(expected.as_str()) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "scheduler credential required" })),
        )
            .into_response())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateListingRequest {
    pub(crate) property_id: String,
    pub(crate) monthly_rent: Decimal,
    pub(crate) security_deposit: Decimal,
    pub(crate) available_from: NaiveDate,
    pub(crate) lease_duration_months: u32,
    #[serde(default)]
    pub(crate) escalation: Option<EscalationBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EscalationBody {
    pub(crate) enabled: bool,
    pub(crate) percentage: Decimal,
    pub(crate) interval_months: u32,
}

impl EscalationBody {
    fn into_policy(self) -> EscalationPolicy {
        EscalationPolicy {
            enabled: self.enabled,
            percentage: self.percentage,
            interval_months: self.interval_months,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateListingRequest {
    pub(crate) monthly_rent: Option<Decimal>,
    pub(crate) security_deposit: Option<Decimal>,
    pub(crate) available_from: Option<NaiveDate>,
    pub(crate) lease_duration_months: Option<u32>,
    pub(crate) is_active: Option<bool>,
    pub(crate) rent_escalation_enabled: Option<bool>,
    pub(crate) escalation_percentage: Option<Decimal>,
    pub(crate) escalation_interval_months: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateLeaseRequest {
    pub(crate) listing_id: String,
    pub(crate) start_date: NaiveDate,
    pub(crate) end_date: NaiveDate,
    pub(crate) payment_day: u32,
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListLeasesQuery {
    #[serde(default)]
    pub(crate) landlord: Option<bool>,
    #[serde(default)]
    pub(crate) tenant: Option<bool>,
    #[serde(default)]
    pub(crate) status: Option<LeaseStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateLeaseStatusRequest {
    pub(crate) status: LeaseStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListPaymentsQuery {
    pub(crate) lease_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecordPaymentRequest {
    pub(crate) payment_method: PaymentMethod,
    #[serde(default)]
    pub(crate) notes: Option<String>,
    /// Settlement date override; defaults to today.
    #[serde(default)]
    pub(crate) paid_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateMaintenanceRequestBody {
    pub(crate) property_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) priority: Option<MaintenancePriority>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListMaintenanceQuery {
    pub(crate) property_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateMaintenanceStatusRequest {
    pub(crate) status: MaintenanceStatus,
}

async fn create_listing_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    headers: HeaderMap,
    Json(payload): Json<CreateListingRequest>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    let request = NewListing {
        property_id: PropertyId(payload.property_id),
        monthly_rent: payload.monthly_rent,
        security_deposit: payload.security_deposit,
        available_from: payload.available_from,
        lease_duration_months: payload.lease_duration_months,
        escalation: payload.escalation.map(EscalationBody::into_policy),
    };
    match api.listings.create(&actor, request) {
        Ok(listing) => (StatusCode::CREATED, Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_listing_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(listing_id): Path<String>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    match api.listings.get(&ListingId(listing_id)) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_listing_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateListingRequest>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    let update = ListingUpdate {
        monthly_rent: payload.monthly_rent,
        security_deposit: payload.security_deposit,
        available_from: payload.available_from,
        lease_duration_months: payload.lease_duration_months,
        is_active: payload.is_active,
        escalation_enabled: payload.rent_escalation_enabled,
        escalation_percentage: payload.escalation_percentage,
        escalation_interval_months: payload.escalation_interval_months,
    };
    match api.listings.update(&ListingId(listing_id), &actor, update) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_listing_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(listing_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    match api.listings.remove(&ListingId(listing_id), &actor) {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_lease_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    headers: HeaderMap,
    Json(payload): Json<CreateLeaseRequest>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    let request = LeaseRequest {
        listing_id: ListingId(payload.listing_id),
        start_date: payload.start_date,
        end_date: payload.end_date,
        payment_day: payload.payment_day,
        notes: payload.notes,
    };
    match api.leases.create(&actor, request) {
        Ok(lease) => (StatusCode::CREATED, Json(lease)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_leases_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    headers: HeaderMap,
    Query(query): Query<ListLeasesQuery>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    let result = if query.landlord.unwrap_or(false) {
        api.leases.list_for_landlord(&actor, query.status)
    } else if query.tenant.unwrap_or(false) {
        api.leases.list_for_tenant(&actor, query.status)
    } else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "specify landlord=true or tenant=true" })),
        )
            .into_response();
    };
    match result {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_lease_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    match api.leases.get(&LeaseId(lease_id), &actor) {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_lease_status_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(lease_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateLeaseStatusRequest>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    match api
        .leases
        .update_status(&LeaseId(lease_id), &actor, payload.status)
    {
        Ok(lease) => (StatusCode::OK, Json(lease)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_payments_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    headers: HeaderMap,
    Query(query): Query<ListPaymentsQuery>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    let Some(lease_id) = query.lease_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "leaseId query parameter is required" })),
        )
            .into_response();
    };
    match api.payments.list_for_lease(&LeaseId(lease_id), &actor) {
        Ok(payments) => (StatusCode::OK, Json(payments)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn pay_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(payment_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<RecordPaymentRequest>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    let paid_on = payload
        .paid_on
        .unwrap_or_else(|| Local::now().date_naive());
    match api.payments.mark_paid(
        &PaymentId(payment_id),
        &actor,
        payload.payment_method,
        payload.notes,
        paid_on,
    ) {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn waive_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(payment_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    match api.payments.waive(&PaymentId(payment_id), &actor) {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn mark_overdue_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(payment_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    if let Err(denied) = authorize_scheduler(&api.scheduler_token, &headers) {
        return denied;
    }
    match api.payments.mark_overdue(&PaymentId(payment_id)) {
        Ok(payment) => (StatusCode::OK, Json(payment)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn run_notifications_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    headers: HeaderMap,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    if let Err(denied) = authorize_scheduler(&api.scheduler_token, &headers) {
        return denied;
    }
    let today = Local::now().date_naive();
    match api.scheduler.run_once(today) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_maintenance_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    headers: HeaderMap,
    Json(payload): Json<CreateMaintenanceRequestBody>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    let request = NewMaintenanceRequest {
        property_id: PropertyId(payload.property_id),
        title: payload.title,
        description: payload.description,
        priority: payload.priority,
    };
    match api.maintenance.create(&actor, request) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_maintenance_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    headers: HeaderMap,
    Query(query): Query<ListMaintenanceQuery>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    let Some(property_id) = query.property_id else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "propertyId query parameter is required" })),
        )
            .into_response();
    };
    match api
        .maintenance
        .list_for_property(&PropertyId(property_id), &actor)
    {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_maintenance_status_handler<S, M>(
    State(api): State<Arc<RentalApi<S, M>>>,
    Path(request_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateMaintenanceStatusRequest>,
) -> Response
where
    S: RentalStore + 'static,
    M: RentMailer + 'static,
{
    let actor = match actor_id(&headers) {
        Ok(actor) => actor,
        Err(denied) => return denied,
    };
    match api
        .maintenance
        .update_status(&RequestId(request_id), &actor, payload.status)
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}
