use crate::{session::RosterEvent, state::RosterState};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt, stream};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

fn roster_event() -> Event {
    Event::default().event("roster").data("changed")
}

/// `roster` whenever the record store changes and `progress` with the upload percentage.
pub async fn sse_feed(
    State(state): State<RosterState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let roster = BroadcastStream::new(state.subscribe()).map(|event| {
        //a lagging receiver missed some changes, which still means a re-render
        match event {
            Ok(RosterEvent::StoreChanged) | Err(_) => Ok::<_, Infallible>(roster_event()),
        }
    });

    let progress = state
        .progress()
        .stream()
        .map(|percent| Ok::<_, Infallible>(Event::default().event("progress").data(format!("{percent}%"))));

    Sse::new(stream::select(roster, progress)).keep_alive(KeepAlive::default())
}
