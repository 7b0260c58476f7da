use thiserror::Error;

use crate::domain::portfolio::FormField;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("an account already exists for this email")]
    EmailTaken,
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("document store failure: {0}")]
    Backend(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation credential is not configured")]
    MissingCredential,
    #[error("generation request failed: {0}")]
    Upstream(String),
    #[error("generation returned no text")]
    EmptyResponse,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please provide your {0}")]
    BlankField(FormField),
    #[error("nothing to save, generate a portfolio first")]
    NothingToSave,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unauthorized { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }

    /// Short notice shown to the user after a failed action.
    pub fn notice(&self) -> String {
        match self {
            Self::Validation(error) => {
                let mut message = error.to_string();
                if let Some(first) = message.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                format!("{message}.")
            }
            Self::Authentication(AuthenticationError::InvalidCredentials) => {
                "Invalid email or password.".to_string()
            }
            Self::Authentication(AuthenticationError::EmailTaken) => {
                "An account already exists for this email.".to_string()
            }
            Self::Authentication(AuthenticationError::ProviderUnavailable(_)) => {
                "Sign-in is temporarily unavailable. Please try again.".to_string()
            }
            Self::Generation(_) => "Failed to generate portfolio. Please try again.".to_string(),
            Self::Store(_) => "Something went wrong while talking to storage. Please try again."
                .to_string(),
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = "unassigned".to_owned();
        match value {
            ApplicationError::Validation(error) => {
                Self::BadRequest { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::Authentication(AuthenticationError::ProviderUnavailable(message)) => {
                Self::ServiceUnavailable { message, correlation_id: unassigned }
            }
            ApplicationError::Authentication(error) => {
                Self::Unauthorized { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::Store(error) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id: unassigned }
            }
            ApplicationError::Generation(GenerationError::MissingCredential) => Self::Internal {
                message: GenerationError::MissingCredential.to_string(),
                correlation_id: unassigned,
            },
            ApplicationError::Generation(error) => {
                Self::ServiceUnavailable { message: error.to_string(), correlation_id: unassigned }
            }
        }
    }
}
