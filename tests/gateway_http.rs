//! HttpGateway against a local stub of the wellness API

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use wellspring::config::{GatewayConfig, ReminderConfig};
use wellspring::{
    Endpoint, Gateway, GatewayError, HttpGateway, HydrationView, NewDiaryEntry, Session,
};

#[derive(Clone, Default)]
struct Stub {
    posted: Arc<Mutex<Vec<Value>>>,
}

async fn list_intake() -> Json<Value> {
    Json(json!([
        {"id": 2, "user": 2, "amount": "1.50", "timestamp": "2024-11-20T08:00:00Z"},
        {"id": 1, "user": 2, "amount": 0.5, "timestamp": "2024-11-19T21:15:00Z"},
        {"id": 3, "user": 7, "amount": 2, "timestamp": "2024-11-20T08:30:00Z"}
    ]))
}

async fn create_intake(State(stub): State<Stub>, Json(body): Json<Value>) -> impl IntoResponse {
    stub.posted.lock().unwrap().push(body.clone());
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 10,
            "user": body["user"],
            "amount": format!("{:.2}", body["amount"].as_f64().unwrap_or(0.0)),
            "timestamp": "2024-11-20T09:00:00.123456Z"
        })),
    )
}

async fn daily_totals(Path(user): Path<u64>) -> Response {
    if user != 2 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!({
        "daily_totals": [
            {"date": "2024-11-19", "total_intake": "0.50"},
            {"date": "2024-11-20", "total_intake": 1.5}
        ]
    }))
    .into_response()
}

async fn list_diary(Path(user): Path<u64>) -> Json<Value> {
    Json(json!([
        {"id": 1, "user": user, "date": "2024-11-20", "mood_descriptors": "happy,content", "emotional_rating": 8}
    ]))
}

async fn create_diary(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    stub.posted.lock().unwrap().push(body.clone());
    Json(json!({
        "id": 5,
        "user": body["user"],
        "date": "2024-11-20",
        "mood_descriptors": body["mood_descriptors"],
        "emotional_rating": body["emotional_rating"]
    }))
}

async fn list_sleep() -> Json<Value> {
    Json(json!([
        {"id": 1, "user": 2, "sleep_start": "2024-11-19T23:00:00Z",
         "sleep_end": "2024-11-20T06:30:00Z", "quality": 4, "duration": "7.50"},
        {"id": 2, "user": 2, "sleep_start": "2024-11-20T23:00:00Z",
         "sleep_end": "2024-11-21T06:00:00Z", "quality": 2, "duration": null}
    ]))
}

async fn sleep_analysis(Path(user): Path<u64>) -> Json<Value> {
    Json(json!({"user": user, "average_quality": "3.50", "total_duration": 27000}))
}

async fn broken_json() -> &'static str {
    "not json"
}

/// Start the stub on an ephemeral port and return its base URL
async fn spawn_stub(stub: Stub) -> String {
    let app = Router::new()
        .route("/hydration/", get(list_intake).post(create_intake))
        .route("/hydration/total_water_intake_by_user/:user/", get(daily_totals))
        .route("/diary/", axum::routing::post(create_diary))
        .route("/diary/user_log/:user/", get(list_diary))
        .route("/sleep/", get(list_sleep).post(broken_json))
        .route("/sleep/sleep_analysis/:user/", get(sleep_analysis))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/", addr)
}

fn client(base_url: String) -> HttpGateway {
    HttpGateway::new(&GatewayConfig {
        base_url,
        request_timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_decodes_intake_numbers_and_strings() {
    let gateway = client(spawn_stub(Stub::default()).await);

    let entries = gateway.list_intake().await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].amount, 1.5);
    assert_eq!(entries[1].amount, 0.5);
    assert_eq!(entries[2].amount, 2.0);

    let totals = gateway.daily_totals(2).await.unwrap();
    assert_eq!(totals[0].date, "2024-11-19");
    assert_eq!(totals[0].amount, 0.5);
    assert_eq!(totals[1].amount, 1.5);
}

#[tokio::test]
async fn test_create_intake_posts_body() {
    let stub = Stub::default();
    let gateway = client(spawn_stub(stub.clone()).await);

    let created = gateway.create_intake(2, 0.75).await.unwrap();
    assert_eq!(created.id, 10);
    assert_eq!(created.amount, 0.75);

    let posted = stub.posted.lock().unwrap().clone();
    assert_eq!(posted, vec![json!({"user": 2, "amount": 0.75})]);
}

#[tokio::test]
async fn test_error_status_names_endpoint() {
    let gateway = client(spawn_stub(Stub::default()).await);

    let err = gateway.daily_totals(9).await.unwrap_err();
    assert_eq!(err.endpoint(), Endpoint::DailyTotals);
    match err {
        GatewayError::Api { status, message, .. } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_body() {
    let gateway = client(spawn_stub(Stub::default()).await);
    let entry = wellspring::NewSleepEntry::from_clock(
        2,
        "23:00",
        "07:00",
        3,
        chrono::NaiveDate::from_ymd_opt(2024, 11, 20).unwrap(),
    )
    .unwrap();

    let err = gateway.create_sleep(&entry).await.unwrap_err();
    assert_eq!(err.endpoint(), Endpoint::CreateSleep);
    assert!(matches!(err, GatewayError::Decode { .. }));
}

#[tokio::test]
async fn test_diary_and_sleep_endpoints() {
    let stub = Stub::default();
    let gateway = client(spawn_stub(stub.clone()).await);

    let diary = gateway.list_diary(2).await.unwrap();
    assert_eq!(diary[0].moods().collect::<Vec<_>>(), vec!["happy", "content"]);

    let entry = NewDiaryEntry::new(2, &["tired", "stressed"], 3).unwrap();
    let created = gateway.create_diary(&entry).await.unwrap();
    assert_eq!(created.mood_descriptors, "tired,stressed");
    assert_eq!(
        stub.posted.lock().unwrap()[0],
        json!({"user": 2, "mood_descriptors": "tired,stressed", "emotional_rating": 3})
    );

    let nights = gateway.list_sleep().await.unwrap();
    assert_eq!(nights[0].duration, Some(7.5));
    assert_eq!(nights[1].duration, None);

    let analysis = gateway.sleep_analysis(2).await.unwrap();
    assert_eq!(analysis.average_quality, Some(3.5));
    assert_eq!(analysis.total_hours(), Some(7.5));
    assert_eq!(analysis.quality_emoji(), Some("😊"));
}

#[tokio::test]
async fn test_view_over_http() {
    let gateway = Arc::new(client(spawn_stub(Stub::default()).await));
    let config = ReminderConfig {
        enabled: false,
        ..ReminderConfig::default()
    };
    let view = HydrationView::open(gateway, Session::new(2, 7.0).unwrap(), &config);

    view.refresh().await.unwrap();
    assert_eq!(view.log().await.len(), 2);

    view.submit(0.25).await.unwrap();
    let today = chrono::NaiveDate::from_ymd_opt(2024, 11, 20).unwrap();
    let snapshot = view.snapshot(today).await;
    assert_eq!(snapshot.today_total, 1.75);
    assert_eq!(snapshot.daily_totals.len(), 2);
    assert_eq!(snapshot.reminder, None);

    view.close().await;
}
