//! Audit Recorder.
//!
//! Records security- and mutation-relevant events after their outcome is
//! known. Recording never fails the originating operation: sink errors are
//! logged on the `audit` target and dropped.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use botfleet_auth::{AuthError, axum_ext::AuthRejectionSink};
use botfleet_security::{PrincipalId, RequestMeta, SecurityContext};
use sea_orm::{ActiveValue::Set, DatabaseConnection, DbErr, EntityTrait};
use serde_json::Value;
use thiserror::Error;

use crate::infra::storage::entity::audit_log;

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Read,
    SuperuserBypass,
    Authenticate,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Read => "read",
            Self::SuperuserBypass => "superuser_bypass",
            Self::Authenticate => "authenticate",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record before it is stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub principal_id: Option<PrincipalId>,
    pub username: Option<String>,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: Option<i64>,
    pub description: String,
    pub details: Option<Value>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl AuditEntry {
    /// Entry attributed to the authenticated principal of `ctx`.
    #[must_use]
    pub fn for_context(
        ctx: &SecurityContext,
        action: AuditAction,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            principal_id: Some(ctx.principal_id()),
            username: Some(ctx.username().to_owned()),
            ..Self::anonymous(ctx.meta(), action, resource_type)
        }
    }

    /// Entry without a principal, e.g. for a rejected credential.
    #[must_use]
    pub fn anonymous(
        meta: &RequestMeta,
        action: AuditAction,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            principal_id: None,
            username: None,
            action,
            resource_type: resource_type.into(),
            resource_id: None,
            description: String::new(),
            details: None,
            client_ip: meta.client_ip.clone(),
            user_agent: meta.user_agent.clone(),
            success: true,
            error_message: None,
        }
    }

    #[must_use]
    pub fn resource_id(mut self, id: i64) -> Self {
        self.resource_id = Some(id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark the entry as a failed attempt.
    #[must_use]
    pub fn failed(mut self, error: impl fmt::Display) -> Self {
        self.success = false;
        self.error_message = Some(error.to_string());
        self
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit store write failed: {0}")]
    Store(#[from] DbErr),

    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination of audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// # Errors
    /// Returns `AuditError` when the record could not be stored.
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Writes `audit_logs` rows.
#[derive(Clone, Debug)]
pub struct SeaOrmAuditSink {
    conn: DatabaseConnection,
}

impl SeaOrmAuditSink {
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl AuditSink for SeaOrmAuditSink {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let am = audit_log::ActiveModel {
            principal_id: Set(entry.principal_id),
            username: Set(entry.username),
            action: Set(entry.action.as_str().to_owned()),
            resource_type: Set(entry.resource_type),
            resource_id: Set(entry.resource_id),
            description: Set(entry.description),
            details: Set(entry.details),
            client_ip: Set(entry.client_ip),
            user_agent: Set(entry.user_agent),
            success: Set(entry.success),
            error_message: Set(entry.error_message),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        audit_log::Entity::insert(am).exec(&self.conn).await?;
        Ok(())
    }
}

/// Records audit entries without ever failing the caller.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl fmt::Debug for AuditRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditRecorder").finish_non_exhaustive()
    }
}

impl AuditRecorder {
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Recorder over the `audit_logs` table.
    #[must_use]
    pub fn sea_orm(conn: DatabaseConnection) -> Self {
        Self::new(Arc::new(SeaOrmAuditSink::new(conn)))
    }

    pub async fn record(&self, entry: AuditEntry) {
        let action = entry.action;
        let resource_type = entry.resource_type.clone();
        if let Err(e) = self.sink.append(entry).await {
            tracing::warn!(
                target: "audit",
                error = %e,
                action = %action,
                resource_type = %resource_type,
                "failed to record audit entry"
            );
        }
    }
}

#[async_trait]
impl AuthRejectionSink for AuditRecorder {
    async fn on_rejected(&self, meta: &RequestMeta, error: &AuthError) {
        let entry = AuditEntry::anonymous(meta, AuditAction::Authenticate, "session")
            .description("rejected credential")
            .failed(error.code());
        self.record(entry).await;
    }
}
