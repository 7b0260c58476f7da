use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::UserId;
use crate::errors::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortfolioId(pub String);

/// Named fields of the portfolio form, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Skills,
    Experience,
    Education,
    Projects,
    Content,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::Name,
        FormField::Skills,
        FormField::Experience,
        FormField::Education,
        FormField::Projects,
        FormField::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Skills => "skills",
            Self::Experience => "experience",
            Self::Education => "education",
            Self::Projects => "projects",
            Self::Content => "content",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of what the user typed into the generator form.
///
/// Stored verbatim next to the generated content. The store accepts empty
/// strings; only [`PortfolioForm::validate`] rejects blanks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub projects: String,
    #[serde(default)]
    pub content: String,
}

impl PortfolioForm {
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Skills => &self.skills,
            FormField::Experience => &self.experience,
            FormField::Education => &self.education,
            FormField::Projects => &self.projects,
            FormField::Content => &self.content,
        }
    }

    /// Reports the first blank field in declaration order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match FormField::ALL.into_iter().find(|field| self.field(*field).trim().is_empty()) {
            Some(field) => Err(ValidationError::BlankField(field)),
            None => Ok(()),
        }
    }
}

/// A record is only ever saved from generated text and the complete form it
/// was generated from.
pub fn validate_for_save(content: &str, form: &PortfolioForm) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::NothingToSave);
    }
    form.validate()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: PortfolioId,
    pub owner_id: UserId,
    pub content: String,
    pub form: PortfolioForm,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Portfolio {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }
}
