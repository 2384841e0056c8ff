use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Router,
};
use futures_util::stream::{self, Stream};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error};

use super::center::NotificationCenter;
use super::domain::{Audience, InboxKey, NotificationId};
use super::store::NotificationError;
use crate::http::envelope;
use crate::workflows::internships::domain::Caller;

/// Inbox endpoints for the authenticated caller plus a server-sent event stream.
pub fn notification_router(center: Arc<NotificationCenter>) -> Router {
    Router::new()
        .route("/notifications", get(list_handler))
        .route("/notifications/unread-count", get(unread_count_handler))
        .route("/notifications/read-all", post(mark_all_read_handler))
        .route("/notifications/stream", get(stream_handler))
        .route("/notifications/:notification_id/read", post(mark_read_handler))
        .with_state(center)
}

fn inbox_of(caller: &Caller) -> InboxKey {
    InboxKey::new(Audience::from(caller.role), caller.user_id.clone())
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        match self {
            NotificationError::NotFound => envelope::failure(StatusCode::NOT_FOUND, self.to_string()),
            NotificationError::Unavailable(_) => {
                error!(error = %self, "notification store failure");
                envelope::failure(StatusCode::INTERNAL_SERVER_ERROR, "unexpected failure")
            }
        }
    }
}

pub(crate) async fn list_handler(
    State(center): State<Arc<NotificationCenter>>,
    caller: Caller,
) -> Response {
    match center.list(&inbox_of(&caller)) {
        Ok(inbox) => envelope::ok(inbox),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn unread_count_handler(
    State(center): State<Arc<NotificationCenter>>,
    caller: Caller,
) -> Response {
    match center.unread_count(&inbox_of(&caller)) {
        Ok(unread) => envelope::ok(json!({ "unread": unread })),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn mark_read_handler(
    State(center): State<Arc<NotificationCenter>>,
    caller: Caller,
    Path(notification_id): Path<String>,
) -> Response {
    match center.mark_read(&inbox_of(&caller), &NotificationId(notification_id)) {
        Ok(notification) => envelope::ok(notification),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn mark_all_read_handler(
    State(center): State<Arc<NotificationCenter>>,
    caller: Caller,
) -> Response {
    match center.mark_all_read(&inbox_of(&caller)) {
        Ok(updated) => envelope::ok(json!({ "updated": updated })),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn stream_handler(
    State(center): State<Arc<NotificationCenter>>,
    caller: Caller,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = center.subscribe(Audience::from(caller.role));
    let recipient = caller.user_id;

    let events = stream::unfold(
        (receiver, recipient),
        |(mut receiver, recipient)| async move {
            loop {
                match receiver.recv().await {
                    Ok(notification) if notification.recipient == recipient => {
                        let event = Event::default()
                            .event(notification.kind.label())
                            .json_data(&notification)
                            .unwrap_or_else(|_| Event::default().comment("unencodable notification"));
                        return Some((Ok(event), (receiver, recipient)));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, recipient = %recipient.0, "notification stream lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        },
    );

    Sse::new(events).keep_alive(KeepAlive::default())
}
