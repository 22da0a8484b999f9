//! HttpBackend against a wiremock dashboard API
//!
//! Covers path layout, bearer auth, camelCase bodies and the status-code mapping for
//! NotFound and capacity rejections.

use fulfillment_inspection::backend::{BackendError, HttpBackend, InspectionBackend};
use fulfillment_inspection::inspection::types::{
    FinalizeRequest, InspectionStep, LifecycleStatus, PhotoRef, PhotographyCommit,
    ProductCategory, ProductId, ProgressRecord,
};
use fulfillment_inspection::inspection::PhotoSlot;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(
        server.uri(),
        Some("station-token".to_string()),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_fetch_product_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/P-1"))
        .and(header("authorization", "Bearer station-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "P-1",
            "name": "Seiko 5",
            "sku": "DP-202401151030-7123-9",
            "category": "watch",
            "status": "inspection",
            "specialPhotographyRequests": ["serial_number"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let product = backend_for(&server)
        .await
        .fetch_product(&ProductId::new("P-1"))
        .await
        .unwrap();
    assert_eq!(product.category, ProductCategory::Watch);
    assert_eq!(product.special_photography_requests, vec!["serial_number"]);
}

#[tokio::test]
async fn test_missing_progress_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/inspection/progress/P-2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .await
        .load_progress(&ProductId::new("P-2"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_progress_record_wire_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products/inspection/progress"))
        .and(body_partial_json(json!({
            "productId": "P-3",
            "currentStep": 2,
            "photos": ["img-1"],
            "photoSlots": [{"id": "front", "label": "Front", "required": true, "photos": ["img-1"]}],
            "weight": "1.5",
            "status": "paused"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut front = PhotoSlot::new("front", "Front", true);
    front.photos.push(PhotoRef::new("img-1"));
    let record = ProgressRecord {
        product_id: ProductId::new("P-3"),
        current_step: InspectionStep::Photography,
        checklist: None,
        visited_categories: Vec::new(),
        photos: vec![PhotoRef::new("img-1")],
        photo_slots: vec![front],
        notes: String::new(),
        weight: Some("1.5".parse().unwrap()),
        status: "paused".to_string(),
        last_updated: None,
    };

    backend_for(&server).await.save_progress(&record).await.unwrap();
}

#[tokio::test]
async fn test_progress_record_parses_from_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/inspection/progress/P-4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "productId": "P-4",
            "currentStep": 3,
            "checklist": {"exterior": {"clean": true, "other_exterior": "light dust"}},
            "photos": [],
            "photoSlots": [],
            "notes": "resume me",
            "status": "paused",
            "lastUpdated": "2024-01-15T10:30:00Z"
        })))
        .mount(&server)
        .await;

    let record = backend_for(&server)
        .await
        .load_progress(&ProductId::new("P-4"))
        .await
        .unwrap();
    assert_eq!(record.current_step, InspectionStep::Packaging);
    assert_eq!(record.notes, "resume me");
    assert!(record.weight.is_none());
    assert!(record.last_updated.is_some());
}

#[tokio::test]
async fn test_photography_commit_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products/P-5/photography"))
        .and(body_partial_json(json!({"productId": "P-5", "notes": "glare on lens"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let commit = PhotographyCommit {
        product_id: ProductId::new("P-5"),
        photos: Vec::new(),
        photo_slots: Vec::new(),
        notes: "glare on lens".to_string(),
    };
    backend_for(&server)
        .await
        .commit_photography(&commit)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_label_request_carries_tracking_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products/P-6/label"))
        .and(body_json(json!({
            "productId": "P-6",
            "trackingCode": "DP-2024T0115T1030-1123",
            "notes": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "trackingArtifactRef": "labels/P-6.pdf",
            "fileName": "label-P-6.pdf"
        })))
        .mount(&server)
        .await;

    let artifact = backend_for(&server)
        .await
        .generate_label(&ProductId::new("P-6"), "DP-2024T0115T1030-1123", "")
        .await
        .unwrap();
    assert_eq!(artifact.tracking_artifact_ref, "labels/P-6.pdf");
}

#[tokio::test]
async fn test_location_validation_maps_bad_request_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/locations/validate"))
        .and(body_json(json!({"locationCode": "STD-A-01"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "loc-1",
            "code": "STD-A-01",
            "name": "Standard A-01",
            "zone": "A",
            "capacity": 10,
            "currentCount": 10
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/locations/validate"))
        .and(body_json(json!({"locationCode": "Z-99"})))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown location"))
        .mount(&server)
        .await;

    let backend = backend_for(&server).await;
    let location = backend.validate_location("STD-A-01").await.unwrap();
    assert!(!location.has_capacity());

    let err = backend.validate_location("Z-99").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_finalize_conflict_is_capacity_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/products/inspection"))
        .and(body_partial_json(json!({
            "productId": "P-7",
            "inspectionNotes": "ok",
            "status": "ready-for-storage",
            "locationId": "loc-1",
            "skipPhotography": false
        })))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let request = FinalizeRequest {
        product_id: ProductId::new("P-7"),
        notes: "ok".to_string(),
        status: LifecycleStatus::ReadyForStorage,
        location_id: "loc-1".to_string(),
        skipped_photography: false,
    };
    let err = backend_for(&server)
        .await
        .finalize_inspection(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::CapacityExceeded { ref location_id } if location_id == "loc-1"));
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/P-8"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .await
        .fetch_product(&ProductId::new("P-8"))
        .await
        .unwrap_err();
    match err {
        BackendError::Http { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/P-9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .await
        .fetch_product(&ProductId::new("P-9"))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)));
}
