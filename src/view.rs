use crate::data::student::{StudentField, StudentRecord};

/// Which dialog the roster screen is showing. Exactly one at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Closed,
    ///choosing between adding one student and uploading a CSV
    SelectingType,
    AddingSingle {
        draft: StudentRecord,
    },
    EditingOne {
        original_id: String,
        draft: StudentRecord,
    },
    UploadingCsv {
        file_name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    OpenMenu,
    ChooseSingle,
    ChooseCsv,
    BeginEdit(StudentRecord),
    EditField(StudentField, String),
    FileChosen(String),
    ///the add/edit form was accepted by the service
    Saved,
    Close,
}

impl ViewState {
    /// Applies `event`. Events that make no sense in the current state leave it unchanged.
    #[must_use]
    pub fn apply(self, event: ViewEvent) -> Self {
        match (self, event) {
            (_, ViewEvent::Close) => Self::Closed,
            (_, ViewEvent::BeginEdit(record)) => Self::EditingOne {
                original_id: record.student_id.clone(),
                draft: record,
            },
            (Self::Closed, ViewEvent::OpenMenu) => Self::SelectingType,
            (Self::SelectingType, ViewEvent::ChooseSingle) => Self::AddingSingle {
                draft: StudentRecord::default(),
            },
            (Self::SelectingType, ViewEvent::ChooseCsv) => Self::UploadingCsv { file_name: None },
            (Self::AddingSingle { mut draft }, ViewEvent::EditField(field, value)) => {
                draft.set(field, value);
                Self::AddingSingle { draft }
            }
            (
                Self::EditingOne {
                    original_id,
                    mut draft,
                },
                ViewEvent::EditField(field, value),
            ) => {
                draft.set(field, value);
                Self::EditingOne { original_id, draft }
            }
            //after adding someone, go back to the chooser so more can be added
            (Self::AddingSingle { .. }, ViewEvent::Saved) => Self::SelectingType,
            (Self::EditingOne { .. }, ViewEvent::Saved) => Self::Closed,
            (Self::UploadingCsv { .. }, ViewEvent::FileChosen(name)) => Self::UploadingCsv {
                file_name: Some(name),
            },
            (state, event) => {
                trace!(?state, ?event, "Ignoring view event");
                state
            }
        }
    }
}
