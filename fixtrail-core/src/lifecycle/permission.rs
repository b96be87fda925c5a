//! Single-flight authorization request guard.
//!
//! The host's permission dialog is an asynchronous operation with explicit
//! completion: the caller begins a request, the platform eventually
//! resolves it with an [`AuthorizationStatus`]. At most one request may be
//! outstanding at a time; a second `begin` is rejected rather than
//! overwriting the first.

use thiserror::Error;

use super::AuthorizationStatus;

/// Errors from the authorization request guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// A request is already outstanding.
    #[error("an authorization request is already in flight")]
    RequestInFlight,
}

/// Guard ensuring at most one outstanding authorization request.
#[derive(Debug, Default)]
pub struct AuthorizationRequest {
    pending: bool,
}

impl AuthorizationRequest {
    /// Create a guard with no outstanding request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a request.
    ///
    /// Fails with [`PermissionError::RequestInFlight`] while another
    /// request is outstanding.
    pub fn begin(&mut self) -> Result<(), PermissionError> {
        if self.pending {
            return Err(PermissionError::RequestInFlight);
        }
        self.pending = true;
        Ok(())
    }

    /// Whether a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Complete the outstanding request with the platform's answer.
    ///
    /// Returns the status when a request was pending, `None` otherwise
    /// (e.g. a late callback after `cancel`).
    pub fn resolve(&mut self, status: AuthorizationStatus) -> Option<AuthorizationStatus> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        Some(status)
    }

    /// Abandon the outstanding request, if any.
    pub fn cancel(&mut self) {
        self.pending = false;
    }
}
