use crate::data::student::StudentRecord;

/// In-memory mirror of the remote roster, in display order.
///
/// Uniqueness of `student_id` is the remote service's job, so the store happily holds
/// duplicates if the service accepted them.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: Vec<StudentRecord>,
}

impl RecordStore {
    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn find(&self, student_id: &str) -> Option<&StudentRecord> {
        self.records.iter().find(|r| r.student_id == student_id)
    }

    pub fn replace_all(&mut self, records: Vec<StudentRecord>) {
        self.records = records;
    }

    pub fn push(&mut self, record: StudentRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = StudentRecord>) {
        self.records.extend(records);
    }

    ///returns whether an entry with `original_id` was found and replaced
    pub fn replace(&mut self, original_id: &str, record: StudentRecord) -> bool {
        match self
            .records
            .iter_mut()
            .find(|r| r.student_id == original_id)
        {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Removes the first entry equal to `record`, or failing that the first entry with the same id.
    pub fn remove(&mut self, record: &StudentRecord) -> Option<StudentRecord> {
        let index = self
            .records
            .iter()
            .position(|r| r == record)
            .or_else(|| {
                self.records
                    .iter()
                    .position(|r| r.student_id == record.student_id)
            })?;
        Some(self.records.remove(index))
    }
}
