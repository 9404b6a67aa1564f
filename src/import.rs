use crate::{
    data::student::{StudentField, StudentRecord},
    error::{CsvSnafu, ImportInProgressSnafu, JoinParseSnafu, RosterError, RosterResult},
    remote::{CsvUpload, ImportAck, RosterClient, progress::UploadProgress},
};
use snafu::ResultExt;
use std::{
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    pub candidates: Vec<StudentRecord>,
    ///rows the parser couldn't read, which are skipped
    pub malformed: usize,
}

/// Reads candidate students out of a CSV, keyed on the header row.
///
/// Unknown columns are ignored and missing ones are left empty. Rows the parser chokes on are
/// counted and logged rather than failing the whole file - only an unreadable header does that.
pub fn parse_candidates(bytes: &[u8]) -> RosterResult<ParsedCsv> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let mut columns: Vec<(usize, StudentField)> = vec![];
    for (index, header) in rdr.headers().context(CsvSnafu)?.iter().enumerate() {
        if let Ok(field) = StudentField::from_str(header) {
            //first column with a given name wins
            if !columns.iter().any(|(_, existing)| *existing == field) {
                columns.push((index, field));
            }
        }
    }

    let mut parsed = ParsedCsv::default();
    for record in rdr.records() {
        let record = match record {
            Ok(x) => x,
            Err(e) => {
                debug!(?e, "Skipping malformed CSV row");
                parsed.malformed += 1;
                continue;
            }
        };

        let mut student = StudentRecord::default();
        for (index, field) in &columns {
            if let Some(value) = record.get(*index) {
                student.set(*field, value.to_string());
            }
        }
        parsed.candidates.push(student);
    }

    Ok(parsed)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Uploading,
}

/// How the roster is brought back in line with the service after a bulk import.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ImportReconcile {
    /// Append what we parsed locally, even though the service may have dropped or deduped rows.
    #[default]
    AppendParsed,
    /// Append the rows the service echoed back, falling back to [`Self::AppendParsed`].
    ServerEcho,
    /// Re-fetch the whole roster, falling back to [`Self::AppendParsed`] if that fails.
    Refetch,
}

impl FromStr for ImportReconcile {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::AppendParsed),
            "echo" => Ok(Self::ServerEcho),
            "refetch" => Ok(Self::Refetch),
            _ => Err(RosterError::UnknownReconcilePolicy {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct ImportBatch {
    pub candidates: Vec<StudentRecord>,
    pub ack: ImportAck,
}

/// The change a finished import should make to the record store.
#[derive(Debug, PartialEq, Eq)]
pub enum Reconciliation {
    Append(Vec<StudentRecord>),
    ReplaceAll(Vec<StudentRecord>),
}

#[derive(Debug, Default)]
pub struct ImportPipeline {
    uploading: AtomicBool,
}

struct UploadingGuard<'a>(&'a AtomicBool);

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ImportPipeline {
    pub fn state(&self) -> ImportState {
        if self.uploading.load(Ordering::Acquire) {
            ImportState::Uploading
        } else {
            ImportState::Idle
        }
    }

    fn begin(&self) -> RosterResult<UploadingGuard<'_>> {
        self.uploading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ImportInProgressSnafu.build())?;
        Ok(UploadingGuard(&self.uploading))
    }

    /// Parses the file while the raw bytes are uploaded. Nothing is kept if either side fails.
    pub async fn run(
        &self,
        client: &dyn RosterClient,
        progress: &UploadProgress,
        upload: CsvUpload,
    ) -> RosterResult<ImportBatch> {
        let _uploading = self.begin()?;
        let span = info_span!("import", job = %Uuid::new_v4(), file = %upload.file_name);

        async move {
            let parse = tokio::task::spawn_blocking({
                let bytes = upload.bytes.clone();
                move || parse_candidates(&bytes)
            });

            let (parsed, ack) = tokio::join!(parse, client.import_many(upload, progress));
            let ack = ack?;
            let parsed = match parsed.context(JoinParseSnafu)? {
                Ok(x) => x,
                Err(e) => {
                    warn!("Service accepted a file that couldn't be parsed locally");
                    return Err(e);
                }
            };

            info!(
                candidates = parsed.candidates.len(),
                malformed = parsed.malformed,
                "Uploaded CSV"
            );
            Ok(ImportBatch {
                candidates: parsed.candidates,
                ack,
            })
        }
        .instrument(span)
        .await
    }
}

pub async fn reconcile(
    policy: ImportReconcile,
    batch: ImportBatch,
    client: &dyn RosterClient,
) -> Reconciliation {
    let ImportBatch { candidates, ack } = batch;

    match (policy, ack.accepted) {
        (ImportReconcile::ServerEcho, Some(accepted)) => Reconciliation::Append(accepted),
        (ImportReconcile::Refetch, _) => match client.list_all().await {
            Ok(all) => Reconciliation::ReplaceAll(all),
            Err(e) => {
                error!(?e, "Error re-fetching roster after import, appending parsed rows");
                Reconciliation::Append(candidates)
            }
        },
        (_, accepted) => {
            match accepted {
                Some(accepted) if accepted.len() != candidates.len() => warn!(
                    parsed = candidates.len(),
                    accepted = accepted.len(),
                    "Service accepted a different number of rows than were parsed, roster may diverge until the next fetch"
                ),
                _ => {}
            }
            Reconciliation::Append(candidates)
        }
    }
}
