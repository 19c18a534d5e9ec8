use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use domain::{CommentEvent, PostId};
use futures::stream::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use crate::state::AppState;

pub async fn sse_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let post_id = PostId(post_id);
    let rx = state.tx_events.subscribe();
    tracing::info!("SSE Connected: post={}", post_id);
    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.post_id() == post_id => Some(to_sse(event)),
        Ok(_) => None,
        Err(_lagged) => {
            tracing::warn!("SSE Client lagged for post {}", post_id);
            None
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}

fn to_sse(event: CommentEvent) -> Result<Event, axum::Error> {
    let (name, data) = match event {
        CommentEvent::Updated {
            comment_id,
            comment_html,
            ..
        } => (
            "update_comment",
            serde_json::json!({ "id": comment_id, "html": comment_html }),
        ),
        CommentEvent::Held { comment_id, .. } => {
            ("hold_comment", serde_json::json!({ "id": comment_id }))
        }
        CommentEvent::Trashed { comment_id, .. } => {
            ("delete_comment", serde_json::json!({ "id": comment_id }))
        }
    };
    Event::default().event(name).json_data(data).map_err(|e| {
        tracing::error!("SSE serialization error: {}", e);
        axum::Error::new(e)
    })
}
