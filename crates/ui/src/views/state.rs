use dioxus::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// Inline validation message, shown as-is next to the form.
    Invalid(String),
    AccessDenied,
    NotFound,
    /// A collaborator could not be reached; the action can be retried.
    Unavailable,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            ViewError::Invalid(message) => message,
            ViewError::AccessDenied => "Invalid email or access code. Please try again.",
            ViewError::NotFound => "This test could not be found.",
            ViewError::Unavailable => "The server could not be reached. Please try again.",
            ViewError::Unknown => "Something went wrong. Please try again.",
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ViewError::Unavailable | ViewError::Unknown)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(ViewError),
}

#[must_use]
pub fn view_state_from_resource<T: Clone>(
    resource: Resource<Result<T, ViewError>>,
) -> ViewState<T> {
    match resource.state().cloned() {
        UseResourceState::Pending => ViewState::Loading,
        UseResourceState::Ready => match resource.value().read().as_ref() {
            Some(Ok(data)) => ViewState::Ready(data.clone()),
            Some(Err(err)) => ViewState::Error(err.clone()),
            None => ViewState::Error(ViewError::Unknown),
        },
        UseResourceState::Paused | UseResourceState::Stopped => ViewState::Idle,
    }
}
