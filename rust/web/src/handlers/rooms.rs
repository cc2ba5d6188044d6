use crate::drafts::{DraftId, DraftManager, DraftStoreError};
use crate::events::DraftEvent;
use bgo_engine::economics::{self, PercentBasis, RoomEconomicsInput};
use bgo_engine::errors::{DraftError, EconomicsError};
use bgo_engine::room::RoomDraft;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use warp::http::{self, StatusCode};
use warp::hyper::body::{Body, Bytes};
use warp::reply::{self, Response};
use warp::Reply;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(flatten)]
    pub input: RoomEconomicsInput,
    pub basis: Option<PercentBasis>,
    /// Switches to the fixed-prize model.
    pub prize_total: Option<f64>,
}

pub async fn preview(request: PreviewRequest) -> Response {
    let computed = match request.prize_total {
        Some(total) => economics::compute_fixed_prize(&request.input, total),
        None => economics::compute_with_basis(&request.input, request.basis.unwrap_or_default()),
    };
    match computed {
        Ok(result) => success_response(StatusCode::OK, result.for_display()),
        Err(err) => {
            tracing::debug!(error = %err, "preview rejected");
            economics_error(err)
        }
    }
}

pub async fn create_draft(drafts: Arc<DraftManager>, draft: RoomDraft) -> Response {
    match drafts.create_draft(draft) {
        Ok(snapshot) => {
            tracing::info!(draft_id = %snapshot.draft_id, "draft opened");
            success_response(StatusCode::CREATED, snapshot)
        }
        Err(err) => draft_error(err),
    }
}

pub async fn get_draft(drafts: Arc<DraftManager>, draft_id: DraftId) -> Response {
    match drafts.snapshot(&draft_id) {
        Ok(snapshot) => success_response(StatusCode::OK, snapshot),
        Err(err) => draft_error(err),
    }
}

pub async fn update_draft(
    drafts: Arc<DraftManager>,
    draft_id: DraftId,
    draft: RoomDraft,
) -> Response {
    match drafts.update_draft(&draft_id, draft) {
        Ok(snapshot) => success_response(StatusCode::OK, snapshot),
        Err(err) => draft_error(err),
    }
}

pub async fn submit_draft(drafts: Arc<DraftManager>, draft_id: DraftId) -> Response {
    match drafts.submit(&draft_id) {
        Ok(submission) => {
            tracing::info!(
                draft_id = %draft_id,
                rounds = submission.payload.rounds.len(),
                warnings = submission.warnings.len(),
                "draft submitted"
            );
            success_response(StatusCode::OK, submission)
        }
        Err(err) => {
            tracing::warn!(draft_id = %draft_id, error = %err, "draft submission refused");
            draft_error(err)
        }
    }
}

pub async fn delete_draft(drafts: Arc<DraftManager>, draft_id: DraftId) -> Response {
    match drafts.discard(&draft_id) {
        Ok(()) => {
            tracing::info!(draft_id = %draft_id, "draft discarded");
            empty_response(StatusCode::NO_CONTENT)
        }
        Err(err) => draft_error(err),
    }
}

/// Server-sent events for one draft. The stream ends after the draft is
/// submitted or discarded (expiry included) or when the client goes away.
pub async fn draft_events(drafts: Arc<DraftManager>, draft_id: DraftId) -> Response {
    let bus = drafts.event_bus();
    // Subscribe before the existence check so a removal in between still
    // reaches this stream.
    let (subscriber_id, mut events) = bus.subscribe(draft_id.clone());
    match drafts.contains(&draft_id) {
        Ok(true) => {}
        Ok(false) => {
            bus.unsubscribe(&draft_id, subscriber_id);
            return draft_error(DraftStoreError::NotFound(draft_id));
        }
        Err(err) => {
            bus.unsubscribe(&draft_id, subscriber_id);
            return draft_error(err);
        }
    }

    let (mut sender, body) = Body::channel();
    let stream_id = draft_id.clone();
    tokio::spawn(async move {
        if sender.send_data(Bytes::from_static(b": subscribed\n\n")).await.is_ok() {
            while let Some(event) = events.recv().await {
                let frame = match sse_frame(&event) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::warn!(draft_id = %stream_id, error = %err, "event not encodable");
                        continue;
                    }
                };
                if sender.send_data(frame).await.is_err() || event.is_terminal() {
                    break;
                }
            }
        }
        bus.unsubscribe(&stream_id, subscriber_id);
        tracing::debug!(draft_id = %stream_id, "event stream closed");
    });

    http::Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .body(body)
        .unwrap_or_else(|err| {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", err.to_string())
        })
}

fn sse_frame(event: &DraftEvent) -> serde_json::Result<Bytes> {
    let data = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("event: {}\ndata: {}\n\n", event.name(), data)))
}

fn success_response<T>(status: StatusCode, body: T) -> Response
where
    T: Serialize,
{
    reply::with_status(reply::json(&body), status).into_response()
}

fn empty_response(status: StatusCode) -> Response {
    let mut response = http::Response::new(warp::hyper::Body::empty());
    *response.status_mut() = status;
    response
}

fn economics_error(err: EconomicsError) -> Response {
    error_response(StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
}

fn draft_error(err: DraftStoreError) -> Response {
    let (status, error_code) = match &err {
        DraftStoreError::NotFound(_) => (StatusCode::NOT_FOUND, "draft_not_found"),
        DraftStoreError::Expired(_) => (StatusCode::NOT_FOUND, "draft_expired"),
        DraftStoreError::Invalid(DraftError::UnbalancedRounds { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "unbalanced_rounds")
        }
        DraftStoreError::Invalid(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_draft"),
        DraftStoreError::StoragePoisoned => {
            (StatusCode::INTERNAL_SERVER_ERROR, "draft_storage_error")
        }
    };
    error_response(status, error_code, err.to_string())
}

pub(crate) fn error_response(status: StatusCode, error: &'static str, message: String) -> Response {
    #[derive(Serialize)]
    struct ErrorBody<'a> {
        error: &'a str,
        message: String,
    }

    let body = ErrorBody { error, message };
    reply::with_status(reply::json(&body), status).into_response()
}
