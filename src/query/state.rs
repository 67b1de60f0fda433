use std::fmt;
use std::sync::Arc;

use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Lifecycle of one query.
pub enum QueryState<T> {
    Idle,
    Loading,
    Success(Arc<T>),
    Error(ApiError),
}

impl<T> QueryState<T> {
    pub fn status(&self) -> QueryStatus {
        match self {
            QueryState::Idle => QueryStatus::Idle,
            QueryState::Loading => QueryStatus::Loading,
            QueryState::Success(_) => QueryStatus::Success,
            QueryState::Error(_) => QueryStatus::Error,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    /// Success or error.
    pub fn is_settled(&self) -> bool {
        matches!(self, QueryState::Success(_) | QueryState::Error(_))
    }

    pub fn data(&self) -> Option<Arc<T>> {
        match self {
            QueryState::Success(data) => Some(Arc::clone(data)),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ApiError>> for QueryState<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => QueryState::Success(Arc::new(data)),
            Err(err) => QueryState::Error(err),
        }
    }
}

// Manual impls: cloning shares the Arc, so `T` itself need not be Clone.
impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Loading => QueryState::Loading,
            QueryState::Success(data) => QueryState::Success(Arc::clone(data)),
            QueryState::Error(err) => QueryState::Error(err.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for QueryState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryState::Idle => write!(f, "Idle"),
            QueryState::Loading => write!(f, "Loading"),
            QueryState::Success(data) => f.debug_tuple("Success").field(data).finish(),
            QueryState::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}
