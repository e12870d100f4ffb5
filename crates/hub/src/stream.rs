use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use futures_util::stream;
use tokio::sync::broadcast::error::RecvError;

use crate::routes::AppState;

pub const POSITION_EVENT: &str = "position";

/// Live feed of committed positions. Only inserts made after the client
/// connects are delivered.
pub async fn position_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.notifier.subscribe();
    log::info!(
        "hub: stream subscriber attached, {} active",
        state.notifier.subscriber_count()
    );
    let events = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(notification) => match Event::default()
                    .event(POSITION_EVENT)
                    .id(notification.id.to_string())
                    .json_data(&notification)
                {
                    Ok(event) => return Some((Ok::<Event, Infallible>(event), rx)),
                    Err(err) => {
                        log::error!("hub: cannot encode position {}: {err}", notification.id);
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("hub: stream subscriber lagged, skipped {skipped} position(s)");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
