use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::Value;

use crate::{management::Coordinator, types::Response};

/// `POST /message`: one request envelope in, one response envelope out.
pub async fn message(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Json(body): Json<Value>,
) -> Json<Response> {
    Json(coordinator.handle_value(body).await)
}
