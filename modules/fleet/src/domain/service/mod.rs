//! Domain service layer - business logic and rules.
//!
//! One submodule per resource. Every data access goes through [`SecureConn`]
//! with a scope derived from the caller's [`SecurityContext`]; nothing here
//! touches a raw connection. Audit entries are recorded after the outcome of
//! each audited operation is known.

use botfleet_db::secure::{AccessScope, ScopableEntity, SecureConn, SecurityContext};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, Order};

use crate::domain::{error::DomainError, model::PageRequest};
use crate::infra::audit::{AuditAction, AuditEntry, AuditRecorder};

mod bots;
mod flows;
mod leads;
mod tracking_links;

pub const BOT: &str = "bot";
pub const LEAD: &str = "lead";
pub const FLOW: &str = "flow";
pub const TRACKING_LINK: &str = "tracking_link";

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_name_length: usize,
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_name_length: 255,
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

impl ServiceConfig {
    /// `(limit, offset)` for a page request, with the limit clamped to
    /// `1..=max_page_size`.
    #[must_use]
    pub fn window(&self, page: PageRequest) -> (u64, u64) {
        let limit = page
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1));
        (limit, page.offset.unwrap_or(0))
    }
}

/// Owned-resource operations for bots, leads, flows and tracking links.
#[derive(Clone, Debug)]
pub struct FleetService {
    sec: SecureConn,
    audit: AuditRecorder,
    config: ServiceConfig,
}

impl FleetService {
    #[must_use]
    pub fn new(sec: SecureConn, audit: AuditRecorder, config: ServiceConfig) -> Self {
        Self { sec, audit, config }
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn list_owned<E>(
        &self,
        scope: &AccessScope,
        resource: &'static str,
        page: PageRequest,
    ) -> Result<Vec<E::Model>, DomainError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
    {
        let (limit, offset) = self.config.window(page);
        let mut query = self.sec.find::<E>(scope);
        if let Some(id) = E::resource_col() {
            query = query.order_by(id, Order::Asc);
        }
        query
            .limit(limit)
            .offset(offset)
            .all(self.sec.conn())
            .await
            .map_err(|e| DomainError::from_scope(resource, e))
    }

    /// Read one owned resource. Misses are audited as failed reads because
    /// they include attempts on other principals' ids.
    async fn get_owned<E>(
        &self,
        ctx: &SecurityContext,
        resource: &'static str,
        id: i64,
    ) -> Result<E::Model, DomainError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
    {
        let found = self
            .sec
            .find_by_id::<E>(&AccessScope::owned_by(ctx), id)
            .map_err(|e| DomainError::from_scope(resource, e))?
            .one(self.sec.conn())
            .await
            .map_err(|e| DomainError::from_scope(resource, e))?;

        if let Some(model) = found {
            return Ok(model);
        }

        let err = DomainError::not_found(resource);
        self.audit
            .record(
                AuditEntry::for_context(ctx, AuditAction::Read, resource)
                    .resource_id(id)
                    .description(format!("read {resource}"))
                    .failed(&err),
            )
            .await;
        Err(err)
    }

    /// Insert with the owner forced to the caller. Audited either way.
    async fn create_owned<E>(
        &self,
        ctx: &SecurityContext,
        resource: &'static str,
        am: E::ActiveModel,
        id_of: fn(&E::Model) -> i64,
    ) -> Result<E::Model, DomainError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
        E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
        E::Model: IntoActiveModel<E::ActiveModel>,
    {
        let result = self
            .sec
            .insert::<E>(ctx, am)
            .await
            .map_err(|e| DomainError::from_scope(resource, e));

        let entry = AuditEntry::for_context(ctx, AuditAction::Create, resource)
            .description(format!("create {resource}"));
        let entry = match &result {
            Ok(model) => entry.resource_id(id_of(model)),
            Err(e) => entry.failed(e),
        };
        self.audit.record(entry).await;
        result
    }

    async fn delete_owned<E>(
        &self,
        ctx: &SecurityContext,
        resource: &'static str,
        id: i64,
    ) -> Result<(), DomainError>
    where
        E: ScopableEntity + EntityTrait,
        E::Column: ColumnTrait + Copy,
    {
        let result = self
            .sec
            .delete_by_id::<E>(&AccessScope::owned_by(ctx), id)
            .await
            .map_err(|e| DomainError::from_scope(resource, e));

        self.record_outcome(
            AuditEntry::for_context(ctx, AuditAction::Delete, resource)
                .resource_id(id)
                .description(format!("delete {resource}")),
            &result,
        )
        .await;
        result
    }

    async fn record_outcome<T>(&self, entry: AuditEntry, result: &Result<T, DomainError>) {
        let entry = match result {
            Ok(_) => entry,
            Err(e) => entry.failed(e),
        };
        self.audit.record(entry).await;
    }

    /// Check that `bot_id`, when given, names a bot the caller owns.
    async fn ensure_own_bot(
        &self,
        ctx: &SecurityContext,
        bot_id: Option<i64>,
    ) -> Result<(), DomainError> {
        let Some(bot_id) = bot_id else {
            return Ok(());
        };
        let count = self
            .sec
            .find_by_id::<crate::infra::storage::entity::bot::Entity>(
                &AccessScope::owned_by(ctx),
                bot_id,
            )
            .map_err(|e| DomainError::from_scope(BOT, e))?
            .count(self.sec.conn())
            .await
            .map_err(|e| DomainError::from_scope(BOT, e))?;
        if count == 0 {
            return Err(DomainError::validation("bot_id", "unknown bot"));
        }
        Ok(())
    }
}

/// Trimmed, non-empty and at most `max` characters.
fn required_text(field: &str, value: &str, max: usize) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    let len = trimmed.chars().count();
    if len > max {
        return Err(DomainError::validation(
            field,
            format!("too long: {len} characters (max: {max})"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Like [`required_text`], but blank input becomes `None`.
fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, DomainError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn window_applies_defaults_and_bounds() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.window(PageRequest::default()), (50, 0));
        assert_eq!(
            cfg.window(PageRequest {
                limit: Some(10_000),
                offset: Some(20)
            }),
            (500, 20)
        );
        assert_eq!(
            cfg.window(PageRequest {
                limit: Some(0),
                offset: None
            }),
            (1, 0)
        );
    }

    #[test]
    fn text_validation() {
        assert_eq!(required_text("name", "  ok ", 10).unwrap(), "ok");
        assert!(required_text("name", "   ", 10).is_err());
        assert!(required_text("name", "abcdef", 5).is_err());
        assert_eq!(optional_text("d", Some(" "), 5).unwrap(), None);
        assert_eq!(optional_text("d", None, 5).unwrap(), None);
        assert_eq!(optional_text("d", Some("x"), 5).unwrap(), Some("x".to_owned()));
    }
}
