use crate::{
    data::{id_locks::IdLocks, store::RecordStore, student::StudentRecord},
    error::RosterResult,
    import::{self, ImportPipeline, ImportReconcile, ImportState, Reconciliation},
    remote::{CsvUpload, RosterClient, progress::UploadProgress},
    view::{ViewEvent, ViewState},
};
use std::sync::Arc;
use tokio::sync::{
    Mutex, RwLock,
    broadcast::{Receiver, Sender, channel},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RosterEvent {
    StoreChanged,
}

/// The roster screen's state and the only thing allowed to change the record store.
///
/// Every operation goes to the service first and only touches the store once the service has
/// said yes. Failures are logged, remembered for display, and leave the store as it was.
#[derive(Debug)]
pub struct RosterSession {
    client: Arc<dyn RosterClient>,
    store: RwLock<RecordStore>,
    id_locks: IdLocks,
    imports: ImportPipeline,
    progress: UploadProgress,
    reconcile: ImportReconcile,
    view: Mutex<ViewState>,
    last_error: Mutex<Option<String>>,
    events: Sender<RosterEvent>,
}

impl RosterSession {
    pub fn new(client: Arc<dyn RosterClient>, reconcile: ImportReconcile) -> Self {
        let (tx, _rx) = channel(16);

        Self {
            client,
            store: RwLock::default(),
            id_locks: IdLocks::default(),
            imports: ImportPipeline::default(),
            progress: UploadProgress::default(),
            reconcile,
            view: Mutex::default(),
            last_error: Mutex::default(),
            events: tx,
        }
    }

    pub async fn records(&self) -> Vec<StudentRecord> {
        self.store.read().await.records().to_vec()
    }

    pub async fn find(&self, student_id: &str) -> Option<StudentRecord> {
        self.store.read().await.find(student_id).cloned()
    }

    pub const fn progress(&self) -> &UploadProgress {
        &self.progress
    }

    pub fn import_state(&self) -> ImportState {
        self.imports.state()
    }

    pub fn subscribe(&self) -> Receiver<RosterEvent> {
        self.events.subscribe()
    }

    pub async fn view(&self) -> ViewState {
        self.view.lock().await.clone()
    }

    pub async fn apply_view_event(&self, event: ViewEvent) -> ViewState {
        let mut view = self.view.lock().await;
        *view = std::mem::take(&mut *view).apply(event);
        view.clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.lock().await.clone()
    }

    pub async fn dismiss_error(&self) {
        self.last_error.lock().await.take();
    }

    fn changed(&self) {
        let _ = self.events.send(RosterEvent::StoreChanged);
    }

    async fn surface<T>(&self, doing: &'static str, result: RosterResult<T>) -> RosterResult<T> {
        let mut last_error = self.last_error.lock().await;
        match result {
            Ok(x) => {
                last_error.take();
                Ok(x)
            }
            Err(e) => {
                error!(?e, kind = ?e.kind(), "Error {doing}");
                *last_error = Some(format!("Error {doing}: {e}"));
                Err(e)
            }
        }
    }

    pub async fn refresh(&self) -> RosterResult<()> {
        let result = self.client.list_all().await;
        let records = self.surface("fetching students", result).await?;

        self.store.write().await.replace_all(records);
        self.changed();
        Ok(())
    }

    pub async fn add_member(&self, record: StudentRecord) -> RosterResult<()> {
        let _guard = self.id_locks.lock(&record.student_id).await;

        let result = self.client.create_one(&record).await;
        self.surface("adding new member", result).await?;

        self.store.write().await.push(record);
        self.changed();
        Ok(())
    }

    /// Saves `record` over the student that was `original_id` before editing.
    pub async fn update_member(&self, original_id: &str, record: StudentRecord) -> RosterResult<()> {
        let _guard = self
            .id_locks
            .lock_all([original_id, record.student_id.as_str()])
            .await;

        let result = self.client.update_one(original_id, &record).await;
        self.surface("updating member", result).await?;

        if !self.store.write().await.replace(original_id, record) {
            warn!(original_id, "Updated student is no longer in the roster, not replacing");
        }
        self.changed();
        Ok(())
    }

    pub async fn remove_member(&self, record: &StudentRecord) -> RosterResult<()> {
        let _guard = self.id_locks.lock(&record.student_id).await;

        let result = self.client.delete_one(&record.student_id).await;
        self.surface("deleting student", result).await?;

        self.store.write().await.remove(record);
        self.changed();
        Ok(())
    }

    ///returns how many students were read from the file, or echoed back by the service
    pub async fn import_csv(&self, upload: CsvUpload) -> RosterResult<usize> {
        let result = self
            .imports
            .run(self.client.as_ref(), &self.progress, upload)
            .await;
        let batch = self.surface("uploading CSV data", result).await?;
        let read = batch.candidates.len();

        let count = match import::reconcile(self.reconcile, batch, self.client.as_ref()).await {
            Reconciliation::Append(records) => {
                let count = records.len();
                self.store.write().await.extend(records);
                count
            }
            Reconciliation::ReplaceAll(records) => {
                self.store.write().await.replace_all(records);
                read
            }
        };

        self.changed();
        Ok(count)
    }
}
