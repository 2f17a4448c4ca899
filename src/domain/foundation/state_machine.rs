//! StateMachine - transition rules shared by lifecycle enums.
//!
//! Implemented by `SyncStatus` (per event) and `SyncRunStatus` (per session).

use super::ValidationError;

/// A status enum with a fixed set of allowed moves.
///
/// Implementors list their edges; `transition_to` and `is_terminal` come
/// with the trait.
///
/// ```ignore
/// let next = SyncStatus::Pending.transition_to(SyncStatus::Synced)?;
/// assert!(next.is_terminal());
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every state reachable in one step.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns `target` when the edge exists, an `invalid_transition` error otherwise.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_transition(self, target));
        }
        Ok(target)
    }

    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
