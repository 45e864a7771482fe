//! Pool store errors

use thiserror::Error;

/// Errors surfaced by the store gateway.
///
/// `Conflict` is the optimistic-concurrency signal: the object's
/// resourceVersion changed between read and write. Callers treat it as
/// retriable; everything else is terminal for the current attempt.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Conditional write lost the race (stale resource version)
    #[error("write conflict on {0}: stale resource version")]
    Conflict(String),

    /// Object absent from the store
    #[error("{0} not found")]
    NotFound(String),

    /// Create raced with an existing object of the same name
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Payload could not be serialized for the API server
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other Kubernetes API failure
    #[error("Kubernetes error: {0}")]
    Api(#[from] kube::Error),
}

impl StoreError {
    /// Fold the API server's status responses for `name` into the store's
    /// own taxonomy. 409 carries two distinct meanings, told apart by the
    /// status reason.
    pub(crate) fn classify(name: &str, err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
                StoreError::AlreadyExists(name.to_string())
            }
            kube::Error::Api(resp) if resp.code == 409 => StoreError::Conflict(name.to_string()),
            kube::Error::Api(resp) if resp.code == 404 => StoreError::NotFound(name.to_string()),
            _ => StoreError::Api(err),
        }
    }

    /// True for the retriable optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}
