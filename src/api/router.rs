//! API router.
//!
//! Returns a composable `Router` with every route under `/api/`.
//!
//! Middleware stack per role group (outermost → innermost):
//! Extension(ApiContext) → Auth (role check) → Audit → Handler

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::ClinicState;

/// Build the clinic API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn clinic_api_router(state: Arc<ClinicState>) -> Router {
    build_router(ApiContext::new(state))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/admin/login", post(endpoints::admin::login))
        .route("/doctors/login", post(endpoints::doctors::login))
        .route("/patients/login", post(endpoints::patients::login))
        .route("/patients/register", post(endpoints::patients::register))
        .route("/doctors", get(endpoints::doctors::list))
        .route("/doctors/filter", get(endpoints::doctors::filter))
        .route(
            "/doctors/:id/slots/:date/:time",
            get(endpoints::doctors::check_slot),
        )
        .route(
            "/availability/:role/:doctor_id/:date",
            get(endpoints::availability::for_doctor),
        )
        .with_state(ctx.clone());

    let admin = Router::new()
        .route("/doctors", post(endpoints::doctors::create))
        .route(
            "/doctors/:id",
            put(endpoints::doctors::update).delete(endpoints::doctors::remove),
        )
        .route("/patients", get(endpoints::patients::list))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::Extension(ctx.clone()));

    let doctor = Router::new()
        .route("/appointments/doctor", get(endpoints::appointments::for_doctor))
        .route(
            "/appointments/:id/status/:status",
            put(endpoints::appointments::change_status),
        )
        .route("/prescriptions", post(endpoints::prescriptions::create))
        .route(
            "/prescriptions/:appointment_id",
            get(endpoints::prescriptions::by_appointment),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_doctor))
        .layer(axum::Extension(ctx.clone()));

    let patient = Router::new()
        .route(
            "/appointments",
            get(endpoints::appointments::mine).post(endpoints::appointments::book),
        )
        .route(
            "/appointments/:id",
            put(endpoints::appointments::update).delete(endpoints::appointments::cancel),
        )
        .route("/patients/me", get(endpoints::patients::me))
        .route(
            "/patients/appointments",
            get(endpoints::patients::appointments),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_patient))
        .layer(axum::Extension(ctx));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .nest("/api", public.merge(admin).merge(doctor).merge(patient))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Local, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::admins;

    fn test_state() -> Arc<ClinicState> {
        let state = Arc::new(ClinicState::in_memory());
        {
            let conn = state.clinic_db().unwrap();
            admins::provision(&conn, "root", "rootpass", state.password_rounds()).unwrap();
        }
        state
    }

    fn make_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(
        state: &Arc<ClinicState>,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let app = clinic_api_router(state.clone());
        let response = app.oneshot(make_request(method, uri, token, body)).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 65536).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn login(state: &Arc<ClinicState>, uri: &str, body: Value) -> String {
        let (status, json) = send(state, "POST", uri, None, Some(body)).await;
        assert_eq!(status, StatusCode::OK, "login failed: {json}");
        json["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(state: &Arc<ClinicState>) -> String {
        login(state, "/api/admin/login", json!({"username": "root", "password": "rootpass"})).await
    }

    /// Registers Dr. Smith (09:00, 10:00, 11:00) and returns (id, token).
    async fn seed_doctor(state: &Arc<ClinicState>) -> (i64, String) {
        let admin = admin_token(state).await;
        let (status, json) = send(
            state,
            "POST",
            "/api/doctors",
            Some(&admin),
            Some(json!({
                "name": "Dr. Smith",
                "specialty": "Cardiology",
                "email": "smith@clinic.test",
                "password": "secret1",
                "phone": "5550001111",
                "available_times": ["09:00:00", "10:00:00", "11:00:00"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let id = json["id"].as_i64().unwrap();
        let token = login(
            state,
            "/api/doctors/login",
            json!({"email": "smith@clinic.test", "password": "secret1"}),
        )
        .await;
        (id, token)
    }

    async fn seed_patient(state: &Arc<ClinicState>, email: &str, phone: &str) -> String {
        let (status, json) = send(
            state,
            "POST",
            "/api/patients/register",
            None,
            Some(json!({
                "name": "Alice Martin",
                "email": email,
                "password": "secret1",
                "phone": phone,
                "address": "1 Main St"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        login(state, "/api/patients/login", json!({"email": email, "password": "secret1"})).await
    }

    fn future_at(days: i64, hour: u32) -> chrono::NaiveDateTime {
        (Local::now().date_naive() + Duration::days(days))
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let state = test_state();
        let (status, json) = send(&state, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"], true);
    }

    #[tokio::test]
    async fn admin_routes_require_admin_token() {
        let state = test_state();
        let (status, json) = send(&state, "GET", "/api/patients", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");

        let patient = seed_patient(&state, "alice@example.com", "5550002222").await;
        let (status, _) = send(&state, "GET", "/api/patients", Some(&patient), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let admin = admin_token(&state).await;
        let (status, json) = send(&state, "GET", "/api/patients", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["patients"].as_array().unwrap().len(), 1);
        assert!(json["patients"][0].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let state = test_state();
        let (status, _) = send(
            &state,
            "POST",
            "/api/admin/login",
            None,
            Some(json!({"username": "root", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let state = test_state();
        seed_patient(&state, "alice@example.com", "5550002222").await;
        let stale = state
            .tokens()
            .issue_at("alice@example.com", Utc::now() - Duration::days(8))
            .unwrap();
        let (status, _) = send(&state, "GET", "/api/patients/me", Some(&stale), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_doctor_email_is_409() {
        let state = test_state();
        seed_doctor(&state).await;
        let admin = admin_token(&state).await;
        let (status, _) = send(
            &state,
            "POST",
            "/api/doctors",
            Some(&admin),
            Some(json!({
                "name": "Dr. Other",
                "specialty": "Neurology",
                "email": "smith@clinic.test",
                "password": "secret1",
                "phone": "5550004444"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, json) = send(&state, "GET", "/api/doctors", None, None).await;
        assert_eq!(json["doctors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_registration_is_400() {
        let state = test_state();
        let (status, json) = send(
            &state,
            "POST",
            "/api/patients/register",
            None,
            Some(json!({
                "name": "Al",
                "email": "alice@example.com",
                "password": "secret1",
                "phone": "5550002222",
                "address": "1 Main St"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (status, _) = send(&state, "POST", "/api/patients/register", None, Some(json!({"name": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn registration_conflict_on_phone() {
        let state = test_state();
        seed_patient(&state, "alice@example.com", "5550002222").await;
        let (status, _) = send(
            &state,
            "POST",
            "/api/patients/register",
            None,
            Some(json!({
                "name": "Bob Stone",
                "email": "bob@example.com",
                "password": "secret1",
                "phone": "5550002222",
                "address": "2 Side St"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn booking_flow_end_to_end() {
        let state = test_state();
        let (doctor_id, doctor) = seed_doctor(&state).await;
        let alice = seed_patient(&state, "alice@example.com", "5550002222").await;
        let bob = seed_patient(&state, "bob@example.com", "5550003333").await;
        let when = future_at(3, 10);
        let date = when.date().format("%Y-%m-%d").to_string();

        // Book 10:00
        let (status, json) = send(
            &state,
            "POST",
            "/api/appointments",
            Some(&alice),
            Some(json!({"doctor_id": doctor_id, "patient_id": 999, "appointment_time": when})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        let id = json["id"].as_i64().unwrap();

        // Availability drops the booked slot
        let (status, json) = send(
            &state,
            "GET",
            &format!("/api/availability/patient/{doctor_id}/{date}"),
            Some(&alice),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!(["09:00:00", "11:00:00"]));

        // Slot check mirrors it
        let (_, json) = send(&state, "GET", &format!("/api/doctors/{doctor_id}/slots/{date}/10:00"), None, None).await;
        assert_eq!(json["status"], "unavailable");

        // Bob cannot move or cancel Alice's appointment
        let later = future_at(4, 9);
        let (status, _) = send(
            &state,
            "PUT",
            &format!("/api/appointments/{id}"),
            Some(&bob),
            Some(json!({"doctor_id": doctor_id, "appointment_time": later})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&state, "DELETE", &format!("/api/appointments/{id}"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Rescheduling onto its own slot conflicts with itself
        let (status, _) = send(
            &state,
            "PUT",
            &format!("/api/appointments/{id}"),
            Some(&alice),
            Some(json!({"doctor_id": doctor_id, "appointment_time": when})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &state,
            "PUT",
            &format!("/api/appointments/{id}"),
            Some(&alice),
            Some(json!({"doctor_id": doctor_id, "appointment_time": later})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = send(&state, "GET", "/api/appointments", Some(&alice), None).await;
        assert_eq!(json["appointments"].as_array().unwrap().len(), 1);
        let (_, json) = send(&state, "GET", "/api/appointments", Some(&bob), None).await;
        assert!(json["appointments"].as_array().unwrap().is_empty());

        // Doctor sees it on the new day
        let later_date = later.date().format("%Y-%m-%d").to_string();
        let (status, json) = send(
            &state,
            "GET",
            &format!("/api/appointments/doctor?date={later_date}"),
            Some(&doctor),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["appointments"].as_array().unwrap().len(), 1);
        assert_eq!(json["appointments"][0]["patient_name"], "Alice Martin");

        // Cancel, then cancel again
        let (status, _) = send(&state, "DELETE", &format!("/api/appointments/{id}"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&state, "DELETE", &format!("/api/appointments/{id}"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn past_appointment_time_is_400() {
        let state = test_state();
        let (doctor_id, _) = seed_doctor(&state).await;
        let alice = seed_patient(&state, "alice@example.com", "5550002222").await;
        let (status, _) = send(
            &state,
            "POST",
            "/api/appointments",
            Some(&alice),
            Some(json!({"doctor_id": doctor_id, "appointment_time": future_at(-1, 9)})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn availability_checks_role_in_path() {
        let state = test_state();
        let (doctor_id, doctor) = seed_doctor(&state).await;
        let date = future_at(1, 9).date().format("%Y-%m-%d").to_string();

        let (status, _) = send(&state, "GET", &format!("/api/availability/doctor/{doctor_id}/{date}"), Some(&doctor), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&state, "GET", &format!("/api/availability/patient/{doctor_id}/{date}"), Some(&doctor), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&state, "GET", &format!("/api/availability/nurse/{doctor_id}/{date}"), Some(&doctor), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&state, "GET", &format!("/api/availability/doctor/999/{date}"), Some(&doctor), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn prescription_completes_appointment_once() {
        let state = test_state();
        let (doctor_id, doctor) = seed_doctor(&state).await;
        let alice = seed_patient(&state, "alice@example.com", "5550002222").await;
        let (_, json) = send(
            &state,
            "POST",
            "/api/appointments",
            Some(&alice),
            Some(json!({"doctor_id": doctor_id, "appointment_time": future_at(2, 9)})),
        )
        .await;
        let id = json["id"].as_i64().unwrap();
        let rx = json!({
            "patient_name": "Alice Martin",
            "appointment_id": id,
            "medication": "Amoxicillin",
            "dosage": "500mg",
            "doctor_notes": "Take with food"
        });

        let (status, _) = send(&state, "POST", "/api/prescriptions", Some(&doctor), Some(rx.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&state, "POST", "/api/prescriptions", Some(&doctor), Some(rx)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, json) = send(&state, "GET", &format!("/api/prescriptions/{id}"), Some(&doctor), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["prescriptions"].as_array().unwrap().len(), 1);

        let (_, json) = send(&state, "GET", "/api/patients/appointments?condition=past", Some(&alice), None).await;
        assert_eq!(json["appointments"].as_array().unwrap().len(), 1);
        assert_eq!(json["appointments"][0]["status"], 1);

        let (status, _) = send(&state, "GET", "/api/prescriptions/424242", Some(&doctor), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_route_validates_value_and_ignores_strangers() {
        let state = test_state();
        let (doctor_id, doctor) = seed_doctor(&state).await;
        let alice = seed_patient(&state, "alice@example.com", "5550002222").await;
        let (_, json) = send(
            &state,
            "POST",
            "/api/appointments",
            Some(&alice),
            Some(json!({"doctor_id": doctor_id, "appointment_time": future_at(2, 9)})),
        )
        .await;
        let id = json["id"].as_i64().unwrap();

        let (status, _) = send(&state, "PUT", &format!("/api/appointments/{id}/status/7"), Some(&doctor), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Patients cannot reach doctor routes at all
        let (status, _) = send(&state, "PUT", &format!("/api/appointments/{id}/status/1"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&state, "PUT", "/api/appointments/9999/status/1", Some(&doctor), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn doctor_update_and_delete() {
        let state = test_state();
        let (doctor_id, _) = seed_doctor(&state).await;
        let admin = admin_token(&state).await;

        let (status, _) = send(
            &state,
            "PUT",
            &format!("/api/doctors/{doctor_id}"),
            Some(&admin),
            Some(json!({
                "name": "Dr. Smith",
                "specialty": "Neurology",
                "email": "smith@clinic.test",
                "available_times": ["14:00:00"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, json) = send(&state, "GET", "/api/doctors/filter?specialty=neurology&time=14:00", None, None).await;
        assert_eq!(json["doctors"].as_array().unwrap().len(), 1);

        let (status, _) = send(&state, "DELETE", &format!("/api/doctors/{doctor_id}"), Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&state, "DELETE", &format!("/api/doctors/{doctor_id}"), Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patient_profile_hides_password() {
        let state = test_state();
        let alice = seed_patient(&state, "alice@example.com", "5550002222").await;
        let (status, json) = send(&state, "GET", "/api/patients/me", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["email"], "alice@example.com");
        assert!(json.get("password_hash").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn login_hashing_does_not_hold_the_store() {
        let rounds = if cfg!(debug_assertions) { 100_000 } else { 1_000_000 };
        let state = test_state();
        {
            let conn = state.clinic_db().unwrap();
            let hash = crate::crypto::hash_password("slowpass", rounds).unwrap();
            crate::db::repository::insert_admin(&conn, "slow", &hash).unwrap();
        }

        let login_state = state.clone();
        let login = tokio::spawn(async move {
            let started = std::time::Instant::now();
            let (status, _) = send(
                &login_state,
                "POST",
                "/api/admin/login",
                None,
                Some(json!({"username": "slow", "password": "slowpass"})),
            )
            .await;
            (status, started.elapsed())
        });
        // Let the login read its credential and start verifying
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let started = std::time::Instant::now();
        let (status, _) = send(&state, "GET", "/api/doctors", None, None).await;
        let listing = started.elapsed();
        assert_eq!(status, StatusCode::OK);

        let (login_status, login_time) = login.await.unwrap();
        assert_eq!(login_status, StatusCode::OK);
        assert!(
            listing * 4 < login_time,
            "listing took {listing:?} while login took {login_time:?}"
        );
    }

    #[tokio::test]
    async fn unknown_account_login_is_401() {
        let state = test_state();
        let (status, json) = send(
            &state,
            "POST",
            "/api/doctors/login",
            None,
            Some(json!({"email": "ghost@clinic.test", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn booking_with_unknown_status_is_400() {
        let state = test_state();
        let (doctor_id, _) = seed_doctor(&state).await;
        let alice = seed_patient(&state, "alice@example.com", "5550002222").await;
        let (status, json) = send(
            &state,
            "POST",
            "/api/appointments",
            Some(&alice),
            Some(json!({"doctor_id": doctor_id, "appointment_time": future_at(2, 9), "status": 7})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (_, json) = send(&state, "GET", "/api/appointments", Some(&alice), None).await;
        assert!(json["appointments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_path_ids_get_json_errors() {
        let state = test_state();
        let (status, json) = send(&state, "GET", "/api/doctors/abc/slots/2030-01-10/09:00", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let alice = seed_patient(&state, "alice@example.com", "5550002222").await;
        let (status, json) = send(&state, "DELETE", "/api/appointments/abc", Some(&alice), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (_, doctor) = seed_doctor(&state).await;
        let (status, json) = send(&state, "GET", "/api/prescriptions/xyz", Some(&doctor), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let state = test_state();
        let (status, _) = send(&state, "GET", "/api/nonexistent", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
