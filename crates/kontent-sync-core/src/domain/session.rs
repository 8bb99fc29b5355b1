//! Sync session progress
//!
//! Tracks where a long-lived consumer stands in the change stream: the
//! current continuation token, the lifecycle state, and cumulative counters.
//! The state machine is enforced here; the network work is driven by
//! [`crate::usecases::SyncSession`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::errors::DomainError;
use super::newtypes::SyncToken;
use super::sync_error::SyncError;

/// Lifecycle state of a sync session
///
/// ```text
/// Uninitialized -> Initialized -> Paging <-> Exhausted
///                        \            \          \
///                         +------------+----------+--> Errored
/// ```
///
/// `Errored` is absorbing. `Exhausted` means "caught up for now"; pulling
/// again later moves the session back to `Paging`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No token yet
    #[default]
    Uninitialized,
    /// A token was obtained, no page pulled yet
    Initialized,
    /// The last pull stopped while more changes were available
    Paging,
    /// The last pull drained all available changes
    Exhausted,
    /// A call failed; the session cannot continue
    Errored,
}

impl SessionState {
    /// Returns true if the transition `self -> target` is allowed
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Uninitialized, Initialized)
                | (Uninitialized, Errored)
                | (Initialized, Paging)
                | (Initialized, Exhausted)
                | (Initialized, Errored)
                | (Paging, Paging)
                | (Paging, Exhausted)
                | (Paging, Errored)
                | (Exhausted, Paging)
                | (Exhausted, Exhausted)
                | (Exhausted, Errored)
        )
    }

    /// Returns true if pages can be pulled in this state
    pub fn can_pull(&self) -> bool {
        matches!(
            self,
            SessionState::Initialized | SessionState::Paging | SessionState::Exhausted
        )
    }

    /// Returns true for the absorbing error state
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Errored)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "uninitialized"),
            SessionState::Initialized => write!(f, "initialized"),
            SessionState::Paging => write!(f, "paging"),
            SessionState::Exhausted => write!(f, "exhausted"),
            SessionState::Errored => write!(f, "errored"),
        }
    }
}

/// Progress record of one sync session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionProgress {
    state: SessionState,
    sync_token: Option<SyncToken>,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    pages_fetched: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<SyncError>,
}

impl SessionProgress {
    /// Creates an uninitialized session record
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            state: SessionState::Uninitialized,
            sync_token: None,
            started_at: now,
            last_activity_at: now,
            pages_fetched: 0,
            last_error: None,
        }
    }

    /// Returns the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the token to continue from, if one was obtained
    pub fn sync_token(&self) -> Option<&SyncToken> {
        self.sync_token.as_ref()
    }

    /// Returns when the session was created
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when the session last changed
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    /// Returns the number of pages pulled over the session's lifetime
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Returns the error that moved the session to `Errored`
    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    /// Fails with `InvalidState` unless `self -> target` is allowed
    pub fn check_transition(&self, target: SessionState) -> Result<(), DomainError> {
        if self.state.can_transition_to(target) {
            Ok(())
        } else {
            Err(DomainError::InvalidState {
                from: self.state.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Returns the token to pull from, or `InvalidState` if the session
    /// cannot pull
    pub fn pull_token(&self) -> Result<&SyncToken, DomainError> {
        match (&self.sync_token, self.state.can_pull()) {
            (Some(token), true) => Ok(token),
            _ => Err(DomainError::InvalidState {
                from: self.state.to_string(),
                to: SessionState::Paging.to_string(),
            }),
        }
    }

    fn transition(&mut self, target: SessionState) -> Result<(), DomainError> {
        self.check_transition(target)?;
        self.state = target;
        self.last_activity_at = Utc::now();
        Ok(())
    }

    /// Records the first token of the session
    pub fn mark_initialized(&mut self, token: SyncToken) -> Result<(), DomainError> {
        self.transition(SessionState::Initialized)?;
        self.sync_token = Some(token);
        Ok(())
    }

    /// Records the outcome of a successful pull
    ///
    /// Moves to `Paging` when more changes were left behind, otherwise to
    /// `Exhausted`.
    pub fn record_pull(
        &mut self,
        token: SyncToken,
        pages: u32,
        more_available: bool,
    ) -> Result<(), DomainError> {
        let target = if more_available {
            SessionState::Paging
        } else {
            SessionState::Exhausted
        };
        self.transition(target)?;
        self.sync_token = Some(token);
        self.pages_fetched += u64::from(pages);
        Ok(())
    }

    /// Records a failed call
    ///
    /// Pages fetched before the failure still count. `resume_token` is the
    /// token the failed request was sent with, when pages were accepted
    /// before it.
    pub fn mark_errored(
        &mut self,
        error: SyncError,
        pages_before_failure: u32,
        resume_token: Option<SyncToken>,
    ) -> Result<(), DomainError> {
        self.transition(SessionState::Errored)?;
        self.pages_fetched += u64::from(pages_before_failure);
        if let Some(token) = resume_token {
            self.sync_token = Some(token);
        }
        self.last_error = Some(error);
        Ok(())
    }
}

impl Default for SessionProgress {
    fn default() -> Self {
        Self::new()
    }
}
