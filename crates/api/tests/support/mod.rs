//! In-process fake pet-store and auth-service servers

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEV_TOKEN: &str = "dev_browser_tok_123";
pub const EMAIL_ID: &str = "idn_2abc";
pub const VERIFICATION_CODE: &str = "424242";

#[derive(Default)]
pub struct PetStoreState {
    pets: Mutex<HashMap<i64, Value>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub posts: AtomicUsize,
    /// 1-based POST number whose response gets a different name
    corrupt_post: Option<usize>,
}

impl PetStoreState {
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn posts(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "code": status.as_u16(), "type": "error", "message": message })),
    )
}

async fn get_pet(State(state): State<Arc<PetStoreState>>, Path(id): Path<String>) -> impl IntoResponse {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 0 => id,
        _ => return error(StatusCode::BAD_REQUEST, "Invalid ID supplied"),
    };
    match state.pets.lock().unwrap().get(&id) {
        Some(pet) => (StatusCode::OK, Json(pet.clone())),
        None => error(StatusCode::NOT_FOUND, "Pet not found"),
    }
}

async fn add_pet(State(state): State<Arc<PetStoreState>>, body: Bytes) -> impl IntoResponse {
    let n = state.posts.fetch_add(1, Ordering::SeqCst) + 1;
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(25)).await;
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    let Ok(mut pet) = serde_json::from_slice::<Value>(&body) else {
        return error(StatusCode::BAD_REQUEST, "bad input");
    };
    if !pet.is_object() {
        return error(StatusCode::METHOD_NOT_ALLOWED, "Invalid input");
    }
    let id_ok = pet.get("id").map_or(true, Value::is_i64);
    if !id_ok || !pet.get("name").map_or(false, Value::is_string) {
        return error(StatusCode::BAD_REQUEST, "bad input");
    }

    let id = pet["id"].as_i64().unwrap_or(0);
    state.pets.lock().unwrap().insert(id, pet.clone());

    if state.corrupt_post == Some(n) {
        pet["name"] = json!("not-what-you-sent");
    }
    (StatusCode::OK, Json(pet))
}

async fn post_pet_with_id() -> impl IntoResponse {
    error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported media type")
}

async fn not_found() -> impl IntoResponse {
    error(StatusCode::NOT_FOUND, "Not found")
}

fn seeded_state(corrupt_post: Option<usize>) -> Arc<PetStoreState> {
    let state = PetStoreState { corrupt_post, ..Default::default() };
    state.pets.lock().unwrap().insert(
        1,
        json!({
            "id": 1,
            "category": { "id": 1, "name": "Dog" },
            "name": "doggie",
            "photoUrls": ["https://img.example/dog.jpg"],
            "tags": [{ "id": 1, "name": "dog" }],
            "status": "available"
        }),
    );
    Arc::new(state)
}

/// Start a fake pet store; returns its base URL and shared state
pub async fn spawn_pet_store() -> (String, Arc<PetStoreState>) {
    spawn_pet_store_corrupting(None).await
}

pub async fn spawn_pet_store_corrupting(corrupt_post: Option<usize>) -> (String, Arc<PetStoreState>) {
    let state = seeded_state(corrupt_post);
    let router = Router::new()
        .route("/pet", post(add_pet))
        .route("/pet/:id", get(get_pet).post(post_pet_with_id))
        .fallback(not_found)
        .with_state(state.clone());
    (serve(router).await, state)
}

async fn dev_browser() -> impl IntoResponse {
    Json(json!({ "id": "dvb_1", "token": DEV_TOKEN }))
}

fn has_session(query: &HashMap<String, String>) -> bool {
    query.get("_clerk_dev_session").map(String::as_str) == Some(DEV_TOKEN)
}

async fn sign_ups(
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !has_session(&query) {
        return error(StatusCode::UNAUTHORIZED, "missing dev session");
    }
    if body.get("email_address").and_then(Value::as_str).is_none() {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "email_address required");
    }
    (StatusCode::OK, Json(json!({ "id": EMAIL_ID, "object": "sign_up_attempt" })))
}

async fn attempt_verification(
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    if !has_session(&query) {
        return error(StatusCode::UNAUTHORIZED, "missing dev session");
    }
    if id != EMAIL_ID || form.get("code").map(String::as_str) != Some(VERIFICATION_CODE) {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "verification failed");
    }
    (StatusCode::OK, Json(json!({ "id": id, "verification": { "status": "verified" } })))
}

async fn me(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    if !has_session(&query) {
        return error(StatusCode::UNAUTHORIZED, "missing dev session");
    }
    (
        StatusCode::OK,
        Json(json!({ "id": "user_1", "publicMetadata": { "onboardingComplete": true } })),
    )
}

/// Start a fake auth-service frontend API; returns its base URL
pub async fn spawn_auth_service() -> String {
    let router = Router::new()
        .route("/v1/dev_browser", post(dev_browser))
        .route("/v1/client/sign_ups", post(sign_ups))
        .route(
            "/v1/me/email_addresses/:id/attempt_verification",
            post(attempt_verification),
        )
        .route("/v1/me", get(me))
        .fallback(not_found);
    serve(router).await
}
