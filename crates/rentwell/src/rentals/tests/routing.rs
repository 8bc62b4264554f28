use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::rentals::router::{rental_router, RentalApi};

fn router_with_token(token: Option<&str>) -> (axum::Router, Services) {
    let services = build_services();
    let api = RentalApi::new(
        services.store.clone(),
        Arc::new(MemoryMailer::default()),
        3,
        token.map(str::to_string),
    );
    (rental_router(Arc::new(api)), services)
}

fn router() -> (axum::Router, Services) {
    router_with_token(None)
}

fn post_json(uri: &str, actor: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(actor) = actor {
        builder = builder.header("x-user-id", actor);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request built")
}

fn patch_json(uri: &str, actor: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::patch(uri).header("content-type", "application/json");
    if let Some(actor) = actor {
        builder = builder.header("x-user-id", actor);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request built")
}

fn listing_body() -> serde_json::Value {
    json!({
        "propertyId": "prop-1",
        "monthlyRent": "1200",
        "securityDeposit": "2400",
        "availableFrom": "2024-01-01",
        "leaseDurationMonths": 12
    })
}

#[tokio::test]
async fn authenticated_routes_require_the_user_header() {
    let (router, _services) = router();

    let response = router
        .oneshot(post_json("/api/v1/rentals/listings", None, listing_body()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "missing x-user-id header");
}

#[tokio::test]
async fn create_listing_route_returns_created() {
    let (router, _services) = router();

    let response = router
        .oneshot(post_json(
            "/api/v1/rentals/listings",
            Some("landlord-1"),
            listing_body(),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["property_id"], "prop-1");
    assert_eq!(payload["is_active"], true);
}

#[tokio::test]
async fn listing_detail_is_readable_without_authentication() {
    let (router, services) = router();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/rentals/listings/{}", listing.id.0))
                .body(Body::empty())
                .expect("request built"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn forbidden_actions_map_to_403_with_the_domain_message() {
    let (router, services) = router();
    let listing = services
        .listings
        .create(&landlord_id(), new_listing())
        .expect("listing created");
    let lease = services
        .leases
        .create(&tenant_id(), lease_request(&listing))
        .expect("lease created");

    let response = router
        .oneshot(patch_json(
            &format!("/api/v1/rentals/leases/{}/status", lease.id.0),
            Some("tenant-1"),
            json!({ "status": "ACTIVE" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "Only the landlord can update lease status");
}

#[tokio::test]
async fn invalid_transition_maps_to_400() {
    let (router, services) = router();
    let lease = activated_lease(&services);

    let response = router
        .oneshot(patch_json(
            &format!("/api/v1/rentals/leases/{}/status", lease.id.0),
            Some("landlord-1"),
            json!({ "status": "PENDING" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        "Invalid status transition from ACTIVE to PENDING"
    );
}

#[tokio::test]
async fn unknown_lease_maps_to_404() {
    let (router, _services) = router();

    let response = router
        .oneshot(
            Request::get("/api/v1/rentals/leases/lease-nope")
                .header("x-user-id", "tenant-1")
                .body(Body::empty())
                .expect("request built"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "Lease not found");
}

#[tokio::test]
async fn lease_listing_requires_a_role_filter() {
    let (router, _services) = router();

    let response = router
        .oneshot(
            Request::get("/api/v1/rentals/leases")
                .header("x-user-id", "tenant-1")
                .body(Body::empty())
                .expect("request built"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tenant_lists_their_leases_with_status_filter() {
    let (router, services) = router();
    activated_lease(&services);

    let response = router
        .oneshot(
            Request::get("/api/v1/rentals/leases?tenant=true&status=ACTIVE")
                .header("x-user-id", "tenant-1")
                .body(Body::empty())
                .expect("request built"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["lease"]["status"], "ACTIVE");
}

#[tokio::test]
async fn payment_listing_requires_lease_id_query() {
    let (router, _services) = router();

    let response = router
        .oneshot(
            Request::get("/api/v1/rentals/payments")
                .header("x-user-id", "tenant-1")
                .body(Body::empty())
                .expect("request built"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "leaseId query parameter is required");
}

#[tokio::test]
async fn paying_through_the_route_records_method_and_date() {
    let (router, services) = router();
    let lease = activated_lease(&services);
    let first = services
        .payments
        .list_for_lease(&lease.id, &tenant_id())
        .expect("listed")[0]
        .clone();

    let response = router
        .oneshot(patch_json(
            &format!("/api/v1/rentals/payments/{}/pay", first.id.0),
            Some("tenant-1"),
            json!({
                "paymentMethod": "BANK_TRANSFER",
                "notes": "rent",
                "paidOn": "2024-01-02"
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "PAID");
    assert_eq!(payload["payment_method"], "BANK_TRANSFER");
    assert_eq!(payload["paid_date"], "2024-01-02");
}

#[tokio::test]
async fn scheduler_routes_reject_callers_without_the_token() {
    let (router, services) = router_with_token(Some("cron-secret"));
    let lease = activated_lease(&services);
    let first = services
        .payments
        .list_for_lease(&lease.id, &landlord_id())
        .expect("listed")[0]
        .clone();

    let response = router
        .clone()
        .oneshot(
            Request::patch(format!(
                "/api/v1/rentals/payments/{}/mark-overdue",
                first.id.0
            ))
            .body(Body::empty())
            .expect("request built"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = router
        .oneshot(
            Request::patch(format!(
                "/api/v1/rentals/payments/{}/mark-overdue",
                first.id.0
            ))
            .header("x-service-token", "cron-secret")
            .body(Body::empty())
            .expect("request built"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "OVERDUE");
}

#[tokio::test]
async fn notification_run_reports_counters() {
    let (router, services) = router_with_token(Some("cron-secret"));
    activated_lease(&services);

    let response = router
        .oneshot(
            Request::post("/api/v1/rentals/notifications/run")
                .header("x-service-token", "cron-secret")
                .body(Body::empty())
                .expect("request built"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload.get("upcoming_found").is_some());
    assert!(payload.get("overdue_marked").is_some());
}

#[tokio::test]
async fn maintenance_routes_cover_create_and_status_update() {
    let (router, services) = router();
    activated_lease(&services);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/rentals/maintenance",
            Some("tenant-1"),
            json!({
                "propertyId": "prop-1",
                "title": "Broken heater",
                "description": "No heat in the bedroom",
                "priority": "URGENT"
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    let request_id = payload["id"].as_str().expect("request id").to_string();
    assert_eq!(payload["priority"], "URGENT");

    let response = router
        .oneshot(patch_json(
            &format!("/api/v1/rentals/maintenance/{request_id}/status"),
            Some("landlord-1"),
            json!({ "status": "IN_PROGRESS" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "IN_PROGRESS");
}
