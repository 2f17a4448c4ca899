//! Conflict resolution record.
//!
//! Captures one divergence found during a sync session: both versions in
//! full, plus the strategy that will settle it. Unresolved while
//! `resolved_at` is absent; read-only once resolved.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{ResolutionDecision, ResolutionStrategy, SyncError};
use crate::domain::foundation::{ConflictId, SyncLogId, Timestamp, UserId};

/// Entity type stamped on conflicts raised for ledger events.
pub const ANIMAL_EVENT_ENTITY: &str = "animal_event";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    id: ConflictId,
    sync_log_id: SyncLogId,
    entity_type: String,
    entity_id: Uuid,
    server_version: Value,
    client_version: Value,
    strategy: ResolutionStrategy,
    merged_version: Option<Value>,
    resolved_by: Option<UserId>,
    resolved_at: Option<Timestamp>,
    notes: Option<String>,
    created_at: Timestamp,
}

/// Persisted shape, used only to reconstitute.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictResolutionParts {
    pub id: ConflictId,
    pub sync_log_id: SyncLogId,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub server_version: Value,
    pub client_version: Value,
    pub strategy: ResolutionStrategy,
    pub merged_version: Option<Value>,
    pub resolved_by: Option<UserId>,
    pub resolved_at: Option<Timestamp>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

impl ConflictResolution {
    /// Opens a record for a divergent ledger event.
    pub fn open(
        sync_log_id: SyncLogId,
        entity_id: Uuid,
        server_version: Value,
        client_version: Value,
        strategy: ResolutionStrategy,
    ) -> Self {
        Self {
            id: ConflictId::new(),
            sync_log_id,
            entity_type: ANIMAL_EVENT_ENTITY.to_string(),
            entity_id,
            server_version,
            client_version,
            strategy,
            merged_version: None,
            resolved_by: None,
            resolved_at: None,
            notes: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn reconstitute(parts: ConflictResolutionParts) -> Self {
        Self {
            id: parts.id,
            sync_log_id: parts.sync_log_id,
            entity_type: parts.entity_type,
            entity_id: parts.entity_id,
            server_version: parts.server_version,
            client_version: parts.client_version,
            strategy: parts.strategy,
            merged_version: parts.merged_version,
            resolved_by: parts.resolved_by,
            resolved_at: parts.resolved_at,
            notes: parts.notes,
            created_at: parts.created_at,
        }
    }

    /// Applies a human decision.
    ///
    /// # Errors
    ///
    /// - `AlreadyResolved` if the record was settled before
    /// - `ResolverRequired` for `AdminDecides` records without a resolver
    /// - `MergedPayloadRequired` for a merge with a null payload
    pub fn resolve(
        &mut self,
        decision: ResolutionDecision,
        resolver: Option<UserId>,
        notes: Option<String>,
        at: Timestamp,
    ) -> Result<(), SyncError> {
        self.ensure_open()?;
        if self.strategy == ResolutionStrategy::AdminDecides && resolver.is_none() {
            return Err(SyncError::ResolverRequired);
        }

        if matches!(&decision, ResolutionDecision::Merge { merged_version } if merged_version.is_null())
        {
            return Err(SyncError::MergedPayloadRequired);
        }

        self.strategy = decision.strategy();
        if let ResolutionDecision::Merge { merged_version } = decision {
            self.merged_version = Some(merged_version);
        }
        self.resolved_by = resolver;
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self.resolved_at = Some(at);
        Ok(())
    }

    /// Settles a record by its own policy strategy, with no resolver.
    pub fn auto_resolve(&mut self, at: Timestamp) -> Result<(), SyncError> {
        self.ensure_open()?;
        if !self.strategy.is_automatic() {
            return Err(SyncError::InvalidStrategy(self.strategy.to_string()));
        }
        self.notes = Some(format!("resolved by {} policy", self.strategy));
        self.resolved_at = Some(at);
        Ok(())
    }

    /// The version that prevails, once resolved.
    pub fn winning_version(&self) -> Option<&Value> {
        self.resolved_at?;
        match self.strategy {
            ResolutionStrategy::ServerWins => Some(&self.server_version),
            ResolutionStrategy::ClientWins => Some(&self.client_version),
            ResolutionStrategy::Merge => self.merged_version.as_ref(),
            ResolutionStrategy::AdminDecides => None,
        }
    }

    fn ensure_open(&self) -> Result<(), SyncError> {
        if self.is_resolved() {
            return Err(SyncError::AlreadyResolved(self.id));
        }
        Ok(())
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    pub fn id(&self) -> &ConflictId {
        &self.id
    }

    pub fn sync_log_id(&self) -> &SyncLogId {
        &self.sync_log_id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn entity_id(&self) -> &Uuid {
        &self.entity_id
    }

    pub fn server_version(&self) -> &Value {
        &self.server_version
    }

    pub fn client_version(&self) -> &Value {
        &self.client_version
    }

    pub fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    pub fn merged_version(&self) -> Option<&Value> {
        self.merged_version.as_ref()
    }

    pub fn resolved_by(&self) -> Option<&UserId> {
        self.resolved_by.as_ref()
    }

    pub fn resolved_at(&self) -> Option<&Timestamp> {
        self.resolved_at.as_ref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open(strategy: ResolutionStrategy) -> ConflictResolution {
        ConflictResolution::open(
            SyncLogId::new(),
            Uuid::new_v4(),
            json!({"weight": 410.0}),
            json!({"weight": 415.0}),
            strategy,
        )
    }

    fn admin() -> UserId {
        UserId::new("admin-1").unwrap()
    }

    #[test]
    fn opens_unresolved() {
        let record = open(ResolutionStrategy::AdminDecides);
        assert!(!record.is_resolved());
        assert!(record.winning_version().is_none());
        assert_eq!(record.entity_type(), ANIMAL_EVENT_ENTITY);
    }

    #[test]
    fn admin_decides_requires_resolver() {
        let mut record = open(ResolutionStrategy::AdminDecides);
        let err = record
            .resolve(ResolutionDecision::ClientWins, None, None, Timestamp::now())
            .unwrap_err();
        assert_eq!(err, SyncError::ResolverRequired);
        assert!(!record.is_resolved());
    }

    #[test]
    fn client_wins_picks_client_snapshot() {
        let mut record = open(ResolutionStrategy::AdminDecides);
        record
            .resolve(ResolutionDecision::ClientWins, Some(admin()), None, Timestamp::now())
            .unwrap();
        assert_eq!(record.strategy(), ResolutionStrategy::ClientWins);
        assert_eq!(record.winning_version(), Some(&json!({"weight": 415.0})));
        assert_eq!(record.resolved_by(), Some(&admin()));
    }

    #[test]
    fn merge_requires_payload() {
        let mut record = open(ResolutionStrategy::AdminDecides);
        let err = record
            .resolve(
                ResolutionDecision::Merge { merged_version: Value::Null },
                Some(admin()),
                None,
                Timestamp::now(),
            )
            .unwrap_err();
        assert_eq!(err, SyncError::MergedPayloadRequired);
        assert!(!record.is_resolved());
    }

    #[test]
    fn merge_keeps_supplied_payload() {
        let mut record = open(ResolutionStrategy::AdminDecides);
        record
            .resolve(
                ResolutionDecision::Merge { merged_version: json!({"weight": 412.5}) },
                Some(admin()),
                Some("averaged scale readings".to_string()),
                Timestamp::now(),
            )
            .unwrap();
        assert_eq!(record.winning_version(), Some(&json!({"weight": 412.5})));
        assert_eq!(record.notes(), Some("averaged scale readings"));
    }

    #[test]
    fn resolved_records_are_read_only() {
        let mut record = open(ResolutionStrategy::AdminDecides);
        record
            .resolve(ResolutionDecision::ServerWins, Some(admin()), None, Timestamp::now())
            .unwrap();
        let err = record
            .resolve(ResolutionDecision::ClientWins, Some(admin()), None, Timestamp::now())
            .unwrap_err();
        assert_eq!(err, SyncError::AlreadyResolved(*record.id()));
        assert_eq!(record.strategy(), ResolutionStrategy::ServerWins);
    }

    #[test]
    fn policy_strategy_auto_resolves_without_resolver() {
        let mut record = open(ResolutionStrategy::ServerWins);
        record.auto_resolve(Timestamp::now()).unwrap();
        assert!(record.is_resolved());
        assert!(record.resolved_by().is_none());
        assert_eq!(record.winning_version(), Some(&json!({"weight": 410.0})));
    }

    #[test]
    fn admin_decides_never_auto_resolves() {
        let mut record = open(ResolutionStrategy::AdminDecides);
        assert!(matches!(
            record.auto_resolve(Timestamp::now()),
            Err(SyncError::InvalidStrategy(_))
        ));
    }
}
