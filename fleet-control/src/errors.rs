use std::time::Duration;

use thiserror::Error;

/// Error taxonomy shared by every fleet operation.
///
/// `InvalidRange`, `ConfirmationRequired` and `Unauthorized` are surfaced
/// before any mutation is attempted. `Unavailable` is reserved for the
/// coordinator side and only ever degrades advisory data. In-tree flows
/// report convergence timeouts and partial batches as data (`WaitOutcome`,
/// `BatchDelete`) rather than failing; `Timeout` and `PartialFailure` are
/// the typed forms kept for `Orchestrator` implementations and callers that
/// need to escalate them.
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("invalid capacity range [{min}, {max}]: min must be >= 0 and <= max")]
    InvalidRange { min: i32, max: i32 },

    #[error("fleet resource not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("coordinator unavailable: {0}")]
    Unavailable(String),

    #[error("partial failure: {deleted} deleted, {failed} failed")]
    PartialFailure { deleted: usize, failed: usize },

    #[error("confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("orchestrator error: {0}")]
    Orchestrator(String),
}

impl FleetError {
    /// Maps an orchestrator API error onto the fleet taxonomy. `what` names
    /// the resource or selector the call was about.
    pub(crate) fn from_kube(err: kube::Error, what: &str) -> Self {
        match &err {
            kube::Error::Api(resp) if resp.code == 404 => {
                FleetError::NotFound(what.to_string())
            }
            kube::Error::Api(resp) if resp.code == 401 || resp.code == 403 => {
                FleetError::Unauthorized(resp.message.clone())
            }
            _ => FleetError::Orchestrator(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} ({code})"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn maps_404_to_not_found() {
        let err = FleetError::from_kube(api_error(404, "NotFound"), "ci-runners");
        assert!(matches!(err, FleetError::NotFound(name) if name == "ci-runners"));
    }

    #[test]
    fn maps_401_and_403_to_unauthorized() {
        for code in [401, 403] {
            let err = FleetError::from_kube(api_error(code, "Forbidden"), "ci-runners");
            assert!(matches!(err, FleetError::Unauthorized(_)));
        }
    }

    #[test]
    fn other_api_errors_stay_orchestrator_errors() {
        let err = FleetError::from_kube(api_error(500, "InternalError"), "ci-runners");
        assert!(matches!(err, FleetError::Orchestrator(_)));
    }
}
