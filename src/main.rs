#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration,
    routes::{
        index::{
            get_index_route, internal_get_roster, internal_post_dismiss_error,
            internal_post_refresh,
        },
        members::{internal_delete_member, internal_post_edit_member, internal_put_new_member},
        modal::{internal_get_modal, internal_post_view},
        sse::sse_feed,
        upload::internal_put_import,
    },
    state::RosterState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tokio::{net::TcpListener, signal};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod import;
mod maud_conveniences;
mod remote;
mod routes;
mod session;
mod state;
#[cfg(test)]
mod testing;
mod view;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
}

fn router(state: RosterState) -> Router {
    let max_upload_bytes = state.config().max_upload_bytes();

    Router::new()
        .route("/", get(get_index_route))
        .route("/internal/roster", get(internal_get_roster))
        .route("/internal/refresh", post(internal_post_refresh))
        .route("/internal/errors/dismiss", post(internal_post_dismiss_error))
        .route("/internal/modal", get(internal_get_modal))
        .route("/internal/view", post(internal_post_view))
        .route(
            "/internal/members",
            put(internal_put_new_member).delete(internal_delete_member),
        )
        .route("/internal/members/edit", post(internal_post_edit_member))
        .route("/internal/import", put(internal_put_import))
        .route("/sse_feed", get(sse_feed))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    //a missing .env is fine, everything has a default
    let dotenv = dotenvy::dotenv();

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");
    if let Err(e) = dotenv {
        warn!(?e, "Unable to load .env file");
    }

    let config = RuntimeConfiguration::new().expect("unable to create config");
    let state = RosterState::new(config.clone()).expect("unable to create state");

    info!(api_base = config.api_base(), reconcile = ?config.reconcile(), "Fetching initial roster");
    if state.refresh().await.is_ok() {
        info!(students = state.records().await.len(), "Loaded roster");
    }

    let server_ip = config.server_ip().to_string();
    let listener = TcpListener::bind(&server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("unable to serve app");
}
