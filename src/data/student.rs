use maud::Render;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One row of the roster, as the remote service stores it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StudentRecord {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl StudentRecord {
    pub fn get(&self, field: StudentField) -> &str {
        match field {
            StudentField::StudentId => &self.student_id,
            StudentField::FirstName => &self.first_name,
            StudentField::LastName => &self.last_name,
            StudentField::Email => &self.email,
        }
    }

    pub fn set(&mut self, field: StudentField, value: String) {
        let slot = match field {
            StudentField::StudentId => &mut self.student_id,
            StudentField::FirstName => &mut self.first_name,
            StudentField::LastName => &mut self.last_name,
            StudentField::Email => &mut self.email,
        };
        *slot = value;
    }

    ///the only validation the roster does - every field has to be filled in
    pub fn missing_fields(&self) -> Vec<StudentField> {
        StudentField::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StudentField {
    StudentId,
    FirstName,
    LastName,
    Email,
}

impl StudentField {
    pub const ALL: [Self; 4] = [Self::StudentId, Self::FirstName, Self::LastName, Self::Email];

    /// Name used both as the CSV header and as the form field name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::StudentId => "student_id",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::StudentId => "StudentID",
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Email => "Email",
        }
    }
}

impl Render for StudentField {
    fn render_to(&self, buffer: &mut String) {
        self.label().render_to(buffer);
    }
}

impl FromStr for StudentField {
    type Err = ();

    //headers are matched exactly, so `Email` is not `email`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or(())
    }
}
