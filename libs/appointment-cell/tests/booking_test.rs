use assert_matches::assert_matches;
use chrono::NaiveTime;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use appointment_cell::models::{
    AppointmentError, AppointmentSearchQuery, AppointmentStatus, AvailabilityCheckRequest,
    BookAppointmentRequest, UpdateStatusRequest,
};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_config::AppConfig;

struct Ids {
    client: Uuid,
    professional: Uuid,
    service: Uuid,
}

impl Ids {
    fn new() -> Self {
        Self {
            client: Uuid::new_v4(),
            professional: Uuid::new_v4(),
            service: Uuid::new_v4(),
        }
    }
}

fn test_config(mock_server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: mock_server.uri(),
        supabase_service_key: "test-key".to_string(),
    }
}

fn professional_row(id: Uuid, active: bool) -> Value {
    json!({
        "id": id,
        "name": "Maria Souza",
        "role": "Hairdresser",
        "phone": null,
        "email": null,
        "color": "#3B82F6",
        "active": active,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn service_row(id: Uuid, duration: i32, price: f64, active: bool) -> Value {
    json!({
        "id": id,
        "name": "Haircut",
        "description": null,
        "price": price,
        "duration": duration,
        "color": "#10B981",
        "active": active,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn appointment_row(ids: &Ids, start: &str, end: &str, status: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "client_id": ids.client,
        "professional_id": ids.professional,
        "service_id": ids.service,
        "appointment_date": "2024-06-01",
        "start_time": start,
        "end_time": end,
        "status": status,
        "price": 50.0,
        "notes": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

fn book_request(ids: &Ids, start_time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        client_id: ids.client,
        professional_id: ids.professional,
        service_id: ids.service,
        appointment_date: "2024-06-01".to_string(),
        start_time: start_time.to_string(),
        status: None,
        notes: None,
        price: None,
    }
}

/// Mounts the reference-data lookups every booking performs: client,
/// professional, service and the professional's service assignment.
async fn setup_reference_mocks(mock_server: &MockServer, ids: &Ids) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("id", format!("eq.{}", ids.client)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": ids.client }])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("id", format!("eq.{}", ids.professional)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([professional_row(ids.professional, true)])),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("id", format!("eq.{}", ids.service)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([service_row(ids.service, 30, 50.0, true)])),
        )
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professional_services"))
        .and(query_param("professional_id", format!("eq.{}", ids.professional)))
        .and(query_param("service_id", format!("eq.{}", ids.service)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "service_id": ids.service }])))
        .mount(mock_server)
        .await;
}

async fn setup_day_mock(mock_server: &MockServer, ids: &Ids, existing: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("professional_id", format!("eq.{}", ids.professional)))
        .and(query_param("appointment_date", "eq.2024-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(existing)))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn booking_derives_end_time_from_service_duration() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    setup_reference_mocks(&mock_server, &ids).await;
    setup_day_mock(&mock_server, &ids, vec![]).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([appointment_row(&ids, "09:00:00", "09:30:00", "scheduled")])),
        )
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let appointment = service.book_appointment(book_request(&ids, "09:00")).await.unwrap();

    assert_eq!(appointment.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(appointment.end_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.price, 50.0);
}

#[tokio::test]
async fn overlapping_booking_is_rejected() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    setup_reference_mocks(&mock_server, &ids).await;
    setup_day_mock(
        &mock_server,
        &ids,
        vec![appointment_row(&ids, "09:00:00", "09:30:00", "scheduled")],
    )
    .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let result = service.book_appointment(book_request(&ids, "09:15")).await;

    assert_matches!(result, Err(AppointmentError::SchedulingConflict));
}

#[tokio::test]
async fn cancelled_slot_can_be_rebooked() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    setup_reference_mocks(&mock_server, &ids).await;
    setup_day_mock(
        &mock_server,
        &ids,
        vec![appointment_row(&ids, "09:00:00", "09:30:00", "cancelled")],
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([appointment_row(&ids, "09:15:00", "09:45:00", "scheduled")])),
        )
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let appointment = service.book_appointment(book_request(&ids, "09:15")).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn back_to_back_booking_succeeds() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    setup_reference_mocks(&mock_server, &ids).await;
    setup_day_mock(
        &mock_server,
        &ids,
        vec![appointment_row(&ids, "09:00:00", "09:30:00", "scheduled")],
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([appointment_row(&ids, "09:30:00", "10:00:00", "scheduled")])),
        )
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let appointment = service.book_appointment(book_request(&ids, "09:30")).await.unwrap();

    assert_eq!(appointment.start_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
}

#[tokio::test]
async fn unknown_status_is_rejected_before_any_lookup() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    let service = AppointmentBookingService::new(&test_config(&mock_server));

    let mut request = book_request(&ids, "09:00");
    request.status = Some("confirmed".to_string());

    let result = service.book_appointment(request).await;
    assert_matches!(result, Err(AppointmentError::InvalidStatus(s)) if s == "confirmed");
}

#[tokio::test]
async fn inactive_professional_cannot_be_booked() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("id", format!("eq.{}", ids.client)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": ids.client }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("id", format!("eq.{}", ids.professional)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([professional_row(ids.professional, false)])),
        )
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let result = service.book_appointment(book_request(&ids, "09:00")).await;

    assert_matches!(result, Err(AppointmentError::InactiveProfessional));
}

#[tokio::test]
async fn unassigned_service_cannot_be_booked() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("id", format!("eq.{}", ids.client)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": ids.client }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("id", format!("eq.{}", ids.professional)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([professional_row(ids.professional, true)])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("id", format!("eq.{}", ids.service)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([service_row(ids.service, 30, 50.0, true)])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professional_services"))
        .and(query_param("professional_id", format!("eq.{}", ids.professional)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let result = service.book_appointment(book_request(&ids, "09:00")).await;

    assert_matches!(result, Err(AppointmentError::ServiceNotOffered));
}

#[tokio::test]
async fn availability_check_reports_derived_end_time() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("id", format!("eq.{}", ids.service)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([service_row(ids.service, 30, 50.0, true)])),
        )
        .mount(&mock_server)
        .await;

    setup_day_mock(
        &mock_server,
        &ids,
        vec![appointment_row(&ids, "09:00:00", "09:30:00", "scheduled")],
    )
    .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));

    let taken = service
        .check_availability(AvailabilityCheckRequest {
            professional_id: ids.professional,
            service_id: ids.service,
            appointment_date: "2024-06-01".to_string(),
            start_time: "09:15".to_string(),
            exclude_appointment_id: None,
        })
        .await
        .unwrap();
    assert!(!taken.available);
    assert_eq!(taken.end_time, "09:45");

    let free = service
        .check_availability(AvailabilityCheckRequest {
            professional_id: ids.professional,
            service_id: ids.service,
            appointment_date: "2024-06-01".to_string(),
            start_time: "10:00".to_string(),
            exclude_appointment_id: None,
        })
        .await
        .unwrap();
    assert!(free.available);
    assert_eq!(free.end_time, "10:30");
}

#[tokio::test]
async fn status_update_rejects_unknown_values() {
    let mock_server = MockServer::start().await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let result = service
        .update_status(
            Uuid::new_v4(),
            UpdateStatusRequest {
                status: "archived".to_string(),
                notes: None,
            },
        )
        .await;

    assert_matches!(result, Err(AppointmentError::InvalidStatus(s)) if s == "archived");
}

#[tokio::test]
async fn status_update_to_current_value_succeeds() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    let row = appointment_row(&ids, "09:00:00", "09:30:00", "scheduled");
    let appointment_id: Uuid = serde_json::from_value(row["id"].clone()).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let updated = service
        .update_status(
            appointment_id,
            UpdateStatusRequest {
                status: "scheduled".to_string(),
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn reschedule_resnapshots_price_from_the_service() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    let row = appointment_row(&ids, "09:00:00", "09:30:00", "scheduled");
    let appointment_id: Uuid = serde_json::from_value(row["id"].clone()).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clients"))
        .and(query_param("id", format!("eq.{}", ids.client)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": ids.client }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("id", format!("eq.{}", ids.professional)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([professional_row(ids.professional, true)])),
        )
        .mount(&mock_server)
        .await;

    // The service has been repriced since the original booking at 50.0.
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("id", format!("eq.{}", ids.service)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([service_row(ids.service, 30, 80.0, true)])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professional_services"))
        .and(query_param("professional_id", format!("eq.{}", ids.professional)))
        .and(query_param("service_id", format!("eq.{}", ids.service)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "service_id": ids.service }])))
        .mount(&mock_server)
        .await;

    setup_day_mock(&mock_server, &ids, vec![row.clone()]).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row.clone()])))
        .mount(&mock_server)
        .await;

    let mut updated_row = row;
    updated_row["price"] = json!(80.0);

    // The PATCH body must carry the current service price even though the
    // request leaves price unset.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(body_partial_json(json!({ "price": 80.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated_row])))
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let updated = service
        .reschedule_appointment(appointment_id, book_request(&ids, "09:00"))
        .await
        .unwrap();

    assert_eq!(updated.price, 80.0);
}

struct ExactQuery(&'static str);

impl Match for ExactQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query() == Some(self.0)
    }
}

#[tokio::test]
async fn unfiltered_search_builds_a_clean_query() {
    let mock_server = MockServer::start().await;

    // No filters: the path must start straight at the order clause, with no
    // stray separator after the question mark.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(ExactQuery("order=appointment_date.desc,start_time.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));
    let appointments = service
        .search_appointments(AppointmentSearchQuery {
            start_date: None,
            end_date: None,
            professional_id: None,
            client_id: None,
            service_id: None,
            status: None,
            limit: None,
            offset: None,
        })
        .await
        .unwrap();

    assert!(appointments.is_empty());
}

#[tokio::test]
async fn reschedule_ignores_its_own_window() {
    let mock_server = MockServer::start().await;
    let ids = Ids::new();

    let row = appointment_row(&ids, "09:00:00", "09:30:00", "scheduled");
    let appointment_id: Uuid = serde_json::from_value(row["id"].clone()).unwrap();

    setup_reference_mocks(&mock_server, &ids).await;
    setup_day_mock(&mock_server, &ids, vec![row.clone()]).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([appointment_row(&ids, "09:15:00", "09:45:00", "scheduled")])),
        )
        .mount(&mock_server)
        .await;

    let service = AppointmentBookingService::new(&test_config(&mock_server));

    // Shifting within the old window only works because the appointment's own
    // row is excluded from the conflict check.
    let updated = service
        .reschedule_appointment(appointment_id, book_request(&ids, "09:15"))
        .await
        .unwrap();

    assert_eq!(updated.start_time, NaiveTime::from_hms_opt(9, 15, 0).unwrap());
}
