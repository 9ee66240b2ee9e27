//! Billing flows against a mocked REST backend
//!
//! 1. Attended appointments joined with invoices, patients, codes and employees,
//!    including invoices with irregular ids or both body keys
//! 2. Missing patients and codes (404) degrade to placeholders
//! 3. A rejected token is refreshed once and the request retried
//! 4. A failed refresh ends the session
//! 5. Invoice creation posts the computed body and refuses invoiced appointments
//! 6. Login stores the token pair

use std::sync::Arc;

use billing_service::*;
use config_engine::{ApiConfig, BillingPolicy};
use futures::future::join_all;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: format!("{}/api", server.uri()),
        access_token: Some("old-token".to_string()),
        refresh_token: Some("refresh-1".to_string()),
        ..ApiConfig::default()
    }
}

fn service(server: &MockServer) -> (Arc<ApiClient>, BillingService) {
    BillingService::from_config(&api_config(server), BillingPolicy::default()).unwrap()
}

fn appointment(id: i64, status: &str, day: u32) -> Value {
    json!({
        "id": id,
        "pacienteId": 1,
        "estado": "PENDIENTE",
        "datosJson": json!({
            "estado": status,
            "fechaHoraCita": format!("2024-10-{day:02}T10:30:00"),
            "medicoAsignado": "Carlos Ruiz",
            "codigoCups": "890201"
        }).to_string()
    })
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn invoiced_seven() -> Value {
    json!({
        "content": [{
            "id": 1,
            "numeroFactura": "FM-202410-000001",
            "jsonData": json!({
                "jsonData": json!({ "citas": [{"id": 7}] }).to_string()
            }).to_string()
        }]
    })
}

async fn mount_collections(server: &MockServer) {
    mount_collections_with(server, invoiced_seven()).await;
}

async fn mount_collections_with(server: &MockServer, invoices: Value) {
    Mock::given(method("GET"))
        .and(path("/api/citas"))
        .and(query_param("page", "0"))
        .and(query_param("size", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                appointment(5, "ATENDIDO", 1),
                appointment(7, "ATENDIDO", 2),
                appointment(8, "CANCELADA", 3),
                appointment(9, "ATENDIDO", 4)
            ],
            "totalElements": 4
        })))
        .expect(1)
        .mount(server)
        .await;

    mount_json(server, "/api/facturas", invoices).await;

    // Older endpoint shape: a bare array
    mount_json(
        server,
        "/api/empleados",
        json!([{
            "id": 10,
            "numeroDocumento": "79456123",
            "datosJson": {
                "informacionPersonalJson": "{\"primerNombre\":\"Carlos\",\"primerApellido\":\"Ruiz\"}",
                "informacionLaboralJson": "{\"cargo\":\"MEDICO\"}"
            }
        }]),
    )
    .await;
}

// ============================================================================
// 1. Attended appointments
// ============================================================================

#[tokio::test]
async fn test_attended_appointments_over_http() {
    let server = MockServer::start().await;
    mount_collections(&server).await;
    mount_json(
        &server,
        "/api/pacientes/1",
        json!({
            "id": 1,
            "numeroDocumento": "1032456789",
            "datosJson": json!({
                "informacionPersonalJson": json!({"primerNombre": "Ana", "primerApellido": "Pérez"}).to_string()
            }).to_string()
        }),
    )
    .await;
    mount_json(
        &server,
        "/api/codigos-cups/codigo/890201",
        json!({"codigo": "890201", "nombreCups": "Consulta medicina general", "valor": 45000}),
    )
    .await;

    let (_, service) = service(&server);
    let result = service
        .attended_appointments(&AppointmentFilters::default())
        .await
        .unwrap();

    let ids: Vec<i64> = result.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![9, 5]);
    assert!(result.iter().all(|a| a.patient_name == "Ana Pérez"));
    assert!(result.iter().all(|a| a.doctor_document == "79456123"));

    let rendered = serde_json::to_value(&result[0]).unwrap();
    assert_eq!(rendered["pacienteNombre"], json!("Ana Pérez"));
    assert_eq!(rendered["procedimiento"], json!("Consulta medicina general"));
    assert_eq!(rendered["valor"], json!(45000));
    assert_eq!(rendered["estado"], json!("ATENDIDO"));
}

#[tokio::test]
async fn test_irregular_invoices_still_exclude_their_appointments() {
    let shapes = [
        json!({"id": 1, "jsonData": "{\"citas\":[{\"id\":7}]}", "datosJson": null}),
        json!({"id": "F-0001", "jsonData": "{\"citas\":[{\"id\":7}]}"}),
        json!({"id": 2, "datosJson": "{\"citas\":[{\"id\":7}]}", "jsonData": {"notas": "sin citas"}}),
    ];

    for invoice in shapes {
        let server = MockServer::start().await;
        mount_collections_with(&server, json!({ "content": [invoice] })).await;

        let (_, service) = service(&server);
        let result = service
            .attended_appointments(&AppointmentFilters::default())
            .await
            .unwrap();

        let ids: Vec<i64> = result.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![9, 5], "invoice shape {invoice}");
    }
}

// ============================================================================
// 2. Lookups that 404
// ============================================================================

#[tokio::test]
async fn test_not_found_lookups_degrade() {
    let server = MockServer::start().await;
    mount_collections(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/pacientes/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/codigos-cups/codigo/890201"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (_, service) = service(&server);
    let result = service
        .attended_appointments(&AppointmentFilters::default())
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert!(result.iter().all(|a| a.patient_name == UNKNOWN_PATIENT));
    assert!(result.iter().all(|a| a.procedure_name == NOT_AVAILABLE));
}

#[tokio::test]
async fn test_backend_failure_surfaces_batch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/citas"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (_, service) = service(&server);
    let err = service
        .attended_appointments(&AppointmentFilters::default())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Error al obtener las citas atendidas"));
    assert!(matches!(err.root(), BillingError::Http { status: 500, .. }));
}

// ============================================================================
// 3. Token refresh
// ============================================================================

#[tokio::test]
async fn test_unauthorized_refreshes_once_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/facturas/3"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/facturas/3"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3,
            "numeroFactura": "FM-202410-000003",
            "estado": "PAGADA",
            "total": "120000",
            "jsonData": "{\"citas\":[{\"id\":5}]}"
        })))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"accessToken": "new-token", "refreshToken": "refresh-2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, service) = service(&server);
    let service = Arc::new(service);

    let results = join_all((0..5).map(|_| {
        let service = service.clone();
        async move { service.invoice(3).await }
    }))
    .await;

    for result in results {
        let detail = result.unwrap();
        assert_eq!(detail.invoice.appointment_ids, vec![5]);
        assert_eq!(detail.record["detallesCompletos"], json!(true));
    }

    let tokens = client.session().tokens().await.unwrap();
    assert_eq!(tokens.access_token, "new-token");
    assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-2"));
}

// ============================================================================
// 4. Failed refresh
// ============================================================================

#[tokio::test]
async fn test_failed_refresh_ends_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/facturas"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, service) = service(&server);
    let err = service.list_invoices(&InvoiceFilters::default()).await.unwrap_err();

    assert!(matches!(err.root(), BillingError::Authentication(_)));
    assert!(!client.session().is_authenticated().await);
}

// ============================================================================
// 5. Invoice creation
// ============================================================================

#[tokio::test]
async fn test_create_invoice_posts_computed_body() {
    let server = MockServer::start().await;
    for (id, valor) in [(1, 30_000), (2, 45_000)] {
        mount_json(
            &server,
            &format!("/api/citas/{id}"),
            json!({
                "id": id,
                "datosJson": {
                    "jsonData": json!({"estado": "ATENDIDO", "valor": valor, "pacienteNombre": "Ana Pérez"}).to_string()
                }
            }),
        )
        .await;
    }
    mount_json(&server, "/api/facturas", json!({"content": []})).await;
    mount_json(&server, "/api/empleados", json!({"content": []})).await;
    Mock::given(method("POST"))
        .and(path("/api/facturas"))
        .and(header("authorization", "Bearer old-token"))
        .and(body_partial_json(json!({
            "estado": "PENDIENTE",
            "total": 75000,
            "notas": "Control",
            "citas": [{"id": 1, "valor": 30000}, {"id": 2, "valor": 45000}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 55, "estado": "PENDIENTE"})))
        .expect(1)
        .mount(&server)
        .await;

    let (_, service) = service(&server);
    let created = service
        .create_invoice(&json!({"notas": "Control"}), &[1, 2])
        .await
        .unwrap();

    assert_eq!(created.id, Some(55));
    assert_eq!(created.total, rust_decimal::Decimal::from(75_000));
    assert_eq!(created.record.get("numeroFactura"), Some(&json!(created.number)));
    assert_eq!(created.record.get("id"), Some(&json!(55)));
}

#[tokio::test]
async fn test_create_refuses_appointment_on_text_id_invoice() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/api/citas/7",
        json!({"id": 7, "datosJson": {"estado": "ATENDIDO", "valor": 30000}}),
    )
    .await;
    mount_json(
        &server,
        "/api/facturas",
        json!([{"id": "F-0001", "jsonData": "{\"citas\":[7]}", "datosJson": null}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/facturas"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 56})))
        .expect(0)
        .mount(&server)
        .await;

    let (_, service) = service(&server);
    let err = service.create_invoice(&json!({}), &[7]).await.unwrap_err();

    assert!(matches!(err.root(), BillingError::AlreadyInvoiced { ids } if ids == &vec![7]));
}

// ============================================================================
// 6. Login
// ============================================================================

#[tokio::test]
async fn test_login_starts_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"username": "facturacion", "password": "secreto"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh", "refreshToken": "r"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = ApiClient::from_config(&ApiConfig {
        base_url: format!("{}/api", server.uri()),
        ..ApiConfig::default()
    })
    .unwrap();

    let tokens = client.login("facturacion", "secreto").await.unwrap();
    assert_eq!(tokens.access_token, "fresh");
    assert_eq!(client.session().access_token().await.as_deref(), Some("fresh"));

    let err = client.login("facturacion", "otra").await.unwrap_err();
    assert!(matches!(err, BillingError::Authentication(_)));
}
