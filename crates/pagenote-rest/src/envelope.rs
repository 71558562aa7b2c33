//! The `{data, error}` result of every terminal action.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::RestError;

/// Outcome of a terminal action.
///
/// Exactly one side is meaningful: on success `error` is `None`; on failure
/// `data` is `T::default()`. For row lists that means an empty vector, for
/// `Option` payloads it means `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub data: T,
    pub error: Option<RestError>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            error: None,
        }
    }

    pub fn failure(error: RestError) -> Self
    where
        T: Default,
    {
        Self {
            data: T::default(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<T, RestError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.data),
        }
    }
}

impl<T: Default> From<Result<T, RestError>> for Envelope<T> {
    fn from(result: Result<T, RestError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::failure(err),
        }
    }
}

impl Envelope<Vec<Value>> {
    /// Converts the rows into typed records.
    pub fn decode<R: DeserializeOwned>(self) -> Result<Vec<R>, RestError> {
        self.into_result()?
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(RestError::from))
            .collect()
    }
}
