use crate::{data::student::StudentRecord, error::RosterResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::{Debug, Display};

pub mod http;
pub mod progress;

use progress::UploadProgress;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RemoteAction {
    List,
    Create,
    Update,
    Delete,
    Import,
}

impl Display for RemoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::List => "QueryStudents",
            Self::Create => "CreateStudent",
            Self::Update => "UpdateStudent",
            Self::Delete => "DeleteStudent",
            Self::Import => "MultiCreateStudent",
        })
    }
}

/// A user-selected CSV file, exactly as it was uploaded.
#[derive(Debug, Clone)]
pub struct CsvUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// What the service said after a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportAck {
    ///rows the service reports as accepted, if it echoed them back
    pub accepted: Option<Vec<StudentRecord>>,
}

/// The remote roster service. Every call is one round trip, never retried.
#[async_trait]
pub trait RosterClient: Debug + Send + Sync {
    async fn list_all(&self) -> RosterResult<Vec<StudentRecord>>;
    async fn create_one(&self, record: &StudentRecord) -> RosterResult<()>;
    /// `original_id` is the `student_id` the record had before it was edited.
    async fn update_one(&self, original_id: &str, record: &StudentRecord) -> RosterResult<()>;
    async fn delete_one(&self, student_id: &str) -> RosterResult<()>;
    async fn import_many(
        &self,
        upload: CsvUpload,
        progress: &UploadProgress,
    ) -> RosterResult<ImportAck>;
}
