use crate::{
    config::RuntimeConfiguration,
    error::{JoinSessionSnafu, RosterResult},
    remote::{RosterClient, http::HttpRosterClient},
    session::RosterSession,
};
use maud::{DOCTYPE, Markup, html};
use snafu::ResultExt;
use std::{ops::Deref, sync::Arc};

#[derive(Clone, Debug)]
pub struct RosterState {
    session: Arc<RosterSession>,
    config: RuntimeConfiguration,
}

impl RosterState {
    pub fn new(config: RuntimeConfiguration) -> RosterResult<Self> {
        let client = HttpRosterClient::new(config.api_base(), config.upload_chunk_bytes())?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    pub fn with_client(client: Arc<dyn RosterClient>, config: RuntimeConfiguration) -> Self {
        Self {
            session: Arc::new(RosterSession::new(client, config.reconcile())),
            config,
        }
    }

    /// Runs `op` on its own task, so it completes even if the request that started it goes away.
    pub async fn detached<T, F, Fut>(&self, op: F) -> RosterResult<T>
    where
        F: FnOnce(Arc<RosterSession>) -> Fut,
        Fut: Future<Output = RosterResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(op(Arc::clone(&self.session)))
            .await
            .context(JoinSessionSnafu)?
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    #[allow(clippy::unused_self)]
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://unpkg.com/htmx-ext-sse@2.2.3" integrity="sha384-Y4gc0CK6Kg+hmulDc6rZPJu0tqvk7EWlih0Oh+2OkAi1ZDlCbBDCQEE2uVk472Ky" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Roster" }
                }
                body hx-ext="sse" class="bg-gray-900 min-h-screen flex flex-col items-center p-8 text-white" {
                    (markup)
                }
            }
        }
    }
}

impl Deref for RosterState {
    type Target = RosterSession;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}
