use crate::remote::RemoteAction;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("Error building HTTP client"))]
    BuildClient { source: reqwest::Error },
    #[snafu(display("Error sending {} request", action))]
    SendRequest {
        source: reqwest::Error,
        action: RemoteAction,
    },
    #[snafu(display("{} request rejected with {}: {:?}", action, status, body))]
    RejectedRequest {
        action: RemoteAction,
        status: reqwest::StatusCode,
        body: String,
    },
    #[snafu(display("Error reading {} response", action))]
    DecodeResponse {
        source: reqwest::Error,
        action: RemoteAction,
    },
    #[snafu(display("Error preparing CSV upload"))]
    BuildUpload { source: reqwest::Error },
    #[snafu(display("Error with CSVs"))]
    Csv { source: csv::Error },
    #[snafu(display("CSV parsing task failed"))]
    JoinParse { source: tokio::task::JoinError },
    #[snafu(display("Roster task failed"))]
    JoinSession { source: tokio::task::JoinError },
    #[snafu(display("Error with multipart form input"))]
    Multipart {
        source: axum::extract::multipart::MultipartError,
    },
    #[snafu(display("Expected exactly one CSV file, found {}", found))]
    ExpectedOneFile { found: usize },
    #[snafu(display("An import is already uploading"))]
    ImportInProgress,
    #[snafu(display("Unable to find student with ID: {:?}", student_id))]
    MissingStudent { student_id: String },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` from {:?}", name, value))]
    ParseEnvVar { name: &'static str, value: String },
    #[snafu(display("Unknown import reconciliation policy {:?}", value))]
    UnknownReconcilePolicy { value: String },
}

/// Coarse classification of failures, used when reporting to the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureKind {
    ///request never completed, or returned a non-success status
    Network,
    ///uploaded file could not be tokenized
    Parse,
    ///anything that never left this process
    Local,
}

impl RosterError {
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::SendRequest { .. }
            | Self::RejectedRequest { .. }
            | Self::DecodeResponse { .. } => FailureKind::Network,
            Self::Csv { .. } | Self::JoinParse { .. } => FailureKind::Parse,
            Self::BuildClient { .. }
            | Self::BuildUpload { .. }
            | Self::JoinSession { .. }
            | Self::Multipart { .. }
            | Self::ExpectedOneFile { .. }
            | Self::ImportInProgress
            | Self::MissingStudent { .. }
            | Self::BadEnvVar { .. }
            | Self::ParseEnvVar { .. }
            | Self::UnknownReconcilePolicy { .. } => FailureKind::Local,
        }
    }
}

impl IntoResponse for RosterError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BG: StatusCode = StatusCode::BAD_GATEWAY; //upstream failed
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        let status_code = match &self {
            Self::BuildClient { .. } => ISE,
            Self::SendRequest { .. } | Self::DecodeResponse { .. } => BG,
            Self::RejectedRequest { .. } => BG,
            Self::BuildUpload { .. } => ISE,
            Self::Csv { .. } => BI,
            Self::JoinParse { .. } | Self::JoinSession { .. } => ISE,
            Self::Multipart { source } => source.status(),
            Self::ExpectedOneFile { .. } => BI,
            Self::ImportInProgress => StatusCode::CONFLICT,
            Self::MissingStudent { .. } => NF,
            Self::BadEnvVar { .. } | Self::ParseEnvVar { .. } => ISE,
            Self::UnknownReconcilePolicy { .. } => ISE,
        };

        error!(?self, "Error!");
        (
            status_code,
            Html(html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Roster Error "}
                    span {(self.to_string())}
                }
            }),
        )
            .into_response()
    }
}
