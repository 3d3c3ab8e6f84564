//! Search placeholders and large-payload endpoints used to exercise
//! limiting and compression.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::response::{mark_passthrough, Message};

const LARGE_PAYLOAD_LEN: usize = 1_000_000;

pub async fn search_books() -> Json<Message> {
    Json(Message::new("Search completed"))
}

pub async fn search_books_default_limit() -> Json<Message> {
    Json(Message::new("Search completed"))
}

pub async fn large_data() -> Response {
    Json(large_payload()).into_response()
}

/// Same payload, marked so compression leaves it alone.
pub async fn large_data_no_compress() -> Response {
    mark_passthrough(Json(large_payload()).into_response())
}

fn large_payload() -> serde_json::Value {
    json!({ "data": "x".repeat(LARGE_PAYLOAD_LEN) })
}
