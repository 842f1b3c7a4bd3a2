use crate::domain::ApiError;

/// What a screen renders for one request: nothing yet, a failure, or the
/// fully validated value. There is no partially loaded state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState<T> {
    #[default]
    Loading,
    Failed {
        error: ApiError,
        retryable: bool,
    },
    Loaded(T),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            FetchState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, FetchState::Failed { retryable: true, .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchState<U> {
        match self {
            FetchState::Loading => FetchState::Loading,
            FetchState::Failed { error, retryable } => FetchState::Failed { error, retryable },
            FetchState::Loaded(value) => FetchState::Loaded(f(value)),
        }
    }
}

impl<T> From<Result<T, ApiError>> for FetchState<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => FetchState::Loaded(value),
            Err(error) => FetchState::Failed {
                retryable: error.is_retryable(),
                error,
            },
        }
    }
}
