pub mod config;
pub mod domain;
pub mod errors;
pub mod prompt;
pub mod view;

pub use domain::portfolio::{FormField, Portfolio, PortfolioForm, PortfolioId};
pub use domain::user::{Session, SessionToken, User, UserId};
pub use errors::{
    ApplicationError, AuthenticationError, GenerationError, InterfaceError, StoreError,
    ValidationError,
};
pub use view::{AccessRule, Gate, Notice, PageState};
