//! Access gating and page states shared by every page.

use serde::Serialize;

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessRule {
    Public,
    RequiresSession,
    /// Pages such as login that a signed-in user should never see.
    ForbidsSession,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    Render,
    Redirect(&'static str),
}

pub fn gate(rule: AccessRule, signed_in: bool) -> Gate {
    match (rule, signed_in) {
        (AccessRule::RequiresSession, false) => Gate::Redirect(LOGIN_PATH),
        (AccessRule::ForbidsSession, true) => Gate::Redirect(DASHBOARD_PATH),
        _ => Gate::Render,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum PageState<T> {
    Empty,
    Populated(T),
}

impl<T> PageState<T> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Populated(_) => "populated",
        }
    }
}

impl<T> PageState<Vec<T>> {
    /// State of a list page once its fetch has resolved.
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Populated(items)
        }
    }
}

/// Notices carried across redirects as `?notice=<code>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    NotFound,
    Deleted,
    Saved,
    LoadFailed,
    DeleteFailed,
    SignedOut,
}

impl Notice {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Deleted => "deleted",
            Self::Saved => "saved",
            Self::LoadFailed => "load_failed",
            Self::DeleteFailed => "delete_failed",
            Self::SignedOut => "signed_out",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "not_found" => Some(Self::NotFound),
            "deleted" => Some(Self::Deleted),
            "saved" => Some(Self::Saved),
            "load_failed" => Some(Self::LoadFailed),
            "delete_failed" => Some(Self::DeleteFailed),
            "signed_out" => Some(Self::SignedOut),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "The requested portfolio could not be found.",
            Self::Deleted => "Portfolio deleted.",
            Self::Saved => "Your portfolio has been saved successfully!",
            Self::LoadFailed => "There was an error loading the portfolio.",
            Self::DeleteFailed => "The portfolio could not be deleted. Please try again.",
            Self::SignedOut => "You have been signed out.",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::NotFound | Self::LoadFailed | Self::DeleteFailed)
    }

    pub fn redirect_to(&self, path: &str) -> String {
        format!("{path}?notice={}", self.code())
    }
}
