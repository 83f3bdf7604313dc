//! Fixture API for exercising the fetch client end to end.
//!
//! Routes:
//! - `POST /users` creates a user (201).
//! - `GET /users/{id}` returns a user; `?fields=a,b` projects the response.
//! - `DELETE /users/{id}` removes a user (204).
//! - `POST /echo` answers with the request body unchanged.
//! - `GET /status/{code}` answers with that status and a JSON message.
//! - `GET /text` answers 200 with a body that is not JSON.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct Projection {
    pub fields: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, User>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/echo", post(echo))
        .route("/status/{code}", get(status))
        .route("/text", get(text))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> (StatusCode, Json<User>) {
    let user = User {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
    };
    db.write().await.insert(user.id, user.clone());
    tracing::debug!(id = %user.id, "created user");
    (StatusCode::CREATED, Json(user))
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Query(projection): Query<Projection>,
) -> Result<Json<Value>, StatusCode> {
    let users = db.read().await;
    let user = users.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let value = serde_json::to_value(user).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    match (projection.fields, value) {
        (Some(fields), Value::Object(map)) => {
            Ok(Json(Value::Object(fetch_core::fields(&fields, &map))))
        }
        (_, value) => Ok(Json(value)),
    }
}

async fn delete_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let mut users = db.write().await;
    users.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let message = status.canonical_reason().unwrap_or("Unknown");
    Ok((status, Json(json!({ "message": message }))))
}

async fn text() -> ([(header::HeaderName, &'static str); 1], &'static str) {
    ([(header::CONTENT_TYPE, "text/plain")], "plain text, not json")
}
