//! # Note Routes
//!
//! - `POST /v1/notes`                — publish a PDF (multipart, session required)
//! - `GET  /v1/notes/{id}?action=…`  — `preview` (public) or `download` (owner or purchaser)
//! - `POST /v1/notes/{id}/purchase`  — buy a note at its listed price
//!
//! The purchase is sent from `buyerAddress` as a node-managed account. The
//! address must be bound to the requester's session, otherwise the request
//! is rejected with 401 before anything reaches the chain.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use notebox_chain::PurchaseReceipt;
use notebox_core::{ContentId, RetrieveAction, ValidationError, WalletAddress};
use notebox_pipeline::{FileUpload, PublishForm, PublishedNote};
use serde::Deserialize;

use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::state::AppState;

/// Assemble the notes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/notes", post(publish_note))
        .route("/v1/notes/:id", get(retrieve_note))
        .route("/v1/notes/:id/purchase", post(purchase_note))
}

/// Query string of a retrieval.
#[derive(Debug, Deserialize)]
pub struct RetrieveQuery {
    pub action: Option<String>,
}

/// Body of a purchase.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub buyer_address: String,
}

/// POST /v1/notes
async fn publish_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<PublishedNote>, AppError> {
    let mut form = PublishForm::default();
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                files.push(FileUpload::new(file_name, bytes.to_vec()));
            }
            "name" => form.name = field.text().await?,
            "authorAddress" => form.author_address = field.text().await?,
            "courseId" => form.course_id = field.text().await?,
            "price" => form.price = field.text().await?,
            "description" => form.description = field.text().await?,
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let upload = FileUpload::single(files)?;
    let published = state.pipeline.publish_note(&user, &form, &upload).await?;
    Ok(Json(published))
}

/// GET /v1/notes/{id}?action=preview|download
async fn retrieve_note(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
    Query(query): Query<RetrieveQuery>,
) -> Result<impl IntoResponse, AppError> {
    let content_id = ContentId::new(id)?;
    let action: RetrieveAction = query
        .action
        .ok_or(ValidationError::MissingField("action"))?
        .parse()?;

    let bytes = state
        .pipeline
        .retrieve(user.as_ref(), &content_id, action)
        .await?;

    let disposition = match action {
        RetrieveAction::Preview => format!("inline; filename=\"{content_id}-preview.pdf\""),
        RetrieveAction::Download => format!("attachment; filename=\"{content_id}.pdf\""),
    };
    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// POST /v1/notes/{id}/purchase
async fn purchase_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<PurchaseReceipt>, AppError> {
    let content_id = ContentId::new(id)?;
    let Json(request) = body?;
    let buyer_address = WalletAddress::new(request.buyer_address)?;
    if !state.sessions.may_spend_from(&user, &buyer_address) {
        return Err(AppError::Unauthorized(
            "buyer address is not bound to this session".into(),
        ));
    }

    let receipt = state
        .pipeline
        .purchase(&user, &buyer_address, &content_id)
        .await?;
    Ok(Json(receipt))
}
