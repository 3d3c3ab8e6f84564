//! Book CRUD handlers.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::books::store::NewBook;
use crate::error::GatewayError;
use crate::http::response::json_message;
use crate::http::server::AppState;

pub async fn list_books(State(state): State<AppState>) -> Response {
    Json(state.books.list()).into_response()
}

pub async fn get_book(
    State(state): State<AppState>,
    uri: Uri,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = id else {
        return non_numeric_id(&uri);
    };

    match state.books.get(id) {
        Some(book) => Json(book).into_response(),
        None => {
            tracing::warn!(book_id = id, "Book with ID {} not found", id);
            json_message(StatusCode::NOT_FOUND, "Book not found")
        }
    }
}

pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<NewBook>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(new_book)) => {
            let book = state.books.create(new_book);
            tracing::info!(book_id = book.id, "Book created");
            (StatusCode::CREATED, Json(book)).into_response()
        }
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!(reason = %rejection.body_text(), "Request body too large");
            rejection.into_response()
        }
        Err(rejection) => {
            tracing::warn!(reason = %rejection.body_text(), "Invalid data");
            json_message(StatusCode::BAD_REQUEST, "Invalid data")
        }
    }
}

pub async fn delete_book(
    State(state): State<AppState>,
    uri: Uri,
    id: Result<Path<u64>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = id else {
        return non_numeric_id(&uri);
    };

    if !state.books.delete(id) {
        tracing::debug!(book_id = id, "Delete of unknown book");
    }
    json_message(StatusCode::OK, "Book deleted")
}

fn non_numeric_id(uri: &Uri) -> Response {
    GatewayError::NotFound {
        path: uri.path().to_string(),
    }
    .into_response()
}
