use crate::{
    data::student::StudentRecord,
    error::{
        BuildClientSnafu, BuildUploadSnafu, DecodeResponseSnafu, RejectedRequestSnafu,
        RosterResult, SendRequestSnafu,
    },
    remote::{CsvUpload, ImportAck, RemoteAction, RosterClient, progress::UploadProgress},
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{
    Body, Client, Response,
    multipart::{Form, Part},
};
use snafu::ResultExt;
use std::convert::Infallible;

/// [`RosterClient`] talking to the roster API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRosterClient {
    client: Client,
    base: String,
    chunk_size: usize,
}

impl HttpRosterClient {
    ///`chunk_size` is how many bytes of an upload are counted per progress update
    pub fn new(base: impl AsRef<str>, chunk_size: usize) -> RosterResult<Self> {
        let client = Client::builder().build().context(BuildClientSnafu)?;

        Ok(Self {
            client,
            base: base.as_ref().trim_end_matches('/').to_string(),
            chunk_size: chunk_size.max(1),
        })
    }

    fn url(&self, action: RemoteAction) -> String {
        format!("{}/api/{action}", self.base)
    }

    ///turns a non-2xx response into an error carrying the response body, otherwise returns the body
    async fn ack(action: RemoteAction, response: Response) -> RosterResult<String> {
        let status = response.status();
        let body = response.text().await.context(DecodeResponseSnafu { action })?;

        if !status.is_success() {
            return RejectedRequestSnafu {
                action,
                status,
                body,
            }
            .fail();
        }

        debug!(%action, %status, ?body, "Response");
        Ok(body)
    }

    fn chunks(&self, bytes: &Bytes) -> Vec<Bytes> {
        (0..bytes.len())
            .step_by(self.chunk_size)
            .map(|start| bytes.slice(start..(start + self.chunk_size).min(bytes.len())))
            .collect()
    }
}

#[async_trait]
impl RosterClient for HttpRosterClient {
    async fn list_all(&self) -> RosterResult<Vec<StudentRecord>> {
        let action = RemoteAction::List;
        let response = self
            .client
            .get(self.url(action))
            .send()
            .await
            .context(SendRequestSnafu { action })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return RejectedRequestSnafu {
                action,
                status,
                body,
            }
            .fail();
        }

        response.json().await.context(DecodeResponseSnafu { action })
    }

    async fn create_one(&self, record: &StudentRecord) -> RosterResult<()> {
        let action = RemoteAction::Create;
        let response = self
            .client
            .put(self.url(action))
            .json(record)
            .send()
            .await
            .context(SendRequestSnafu { action })?;

        Self::ack(action, response).await.map(drop)
    }

    async fn update_one(&self, original_id: &str, record: &StudentRecord) -> RosterResult<()> {
        let action = RemoteAction::Update;
        let response = self
            .client
            .put(self.url(action))
            .query(&[("student_id", original_id)])
            .json(record)
            .send()
            .await
            .context(SendRequestSnafu { action })?;

        Self::ack(action, response).await.map(drop)
    }

    async fn delete_one(&self, student_id: &str) -> RosterResult<()> {
        let action = RemoteAction::Delete;
        let response = self
            .client
            .delete(self.url(action))
            .query(&[("student_id", student_id)])
            .send()
            .await
            .context(SendRequestSnafu { action })?;

        Self::ack(action, response).await.map(drop)
    }

    async fn import_many(
        &self,
        upload: CsvUpload,
        progress: &UploadProgress,
    ) -> RosterResult<ImportAck> {
        let action = RemoteAction::Import;
        let total = upload.bytes.len() as u64;

        let mut tracker = progress.begin(total);
        let body = futures::stream::iter(self.chunks(&upload.bytes)).map(move |chunk| {
            tracker.advance(chunk.len());
            Ok::<_, Infallible>(chunk)
        });

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(upload.file_name)
            .mime_str("text/csv")
            .context(BuildUploadSnafu)?;

        let response = self
            .client
            .put(self.url(action))
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .context(SendRequestSnafu { action })?;

        let body = Self::ack(action, response).await?;
        progress.finish();

        Ok(ImportAck {
            accepted: serde_json::from_str(&body).ok(),
        })
    }
}
