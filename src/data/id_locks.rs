use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serialises remote mutations per `student_id`, so that two edits of the same student
/// are applied in the order they were issued instead of whichever response lands last.
#[derive(Debug, Default)]
pub struct IdLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

#[derive(Debug)]
#[must_use = "the id is only locked while the guard is held"]
pub struct IdGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl IdLocks {
    pub async fn lock(&self, student_id: &str) -> IdGuard {
        self.lock_all([student_id]).await
    }

    /// Locks every id given, always in sorted order so overlapping callers can't deadlock.
    pub async fn lock_all<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> IdGuard {
        let mut ids: Vec<&str> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> = {
            let mut locks = self.locks.lock().await;
            //nobody but the map holds these, so nobody is waiting on them
            locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);

            ids.into_iter()
                .map(|id| Arc::clone(locks.entry(id.to_string()).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        IdGuard { _guards: guards }
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}
