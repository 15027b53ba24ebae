use botfleet_db::secure::{AccessScope, SecurityContext};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use serde_json::json;

use super::{BOT, FleetService, optional_text, required_text};
use crate::domain::error::DomainError;
use crate::domain::model::{Bot, BotPatch, NewBot, PageRequest};
use crate::infra::audit::{AuditAction, AuditEntry};
use crate::infra::storage::entity::bot;

const MAX_TOKEN_LENGTH: usize = 512;
const MAX_DESCRIPTION_LENGTH: usize = 2000;

impl FleetService {
    /// Bots owned by the caller, ordered by id.
    ///
    /// # Errors
    /// Returns `DomainError::Database` if the query fails.
    pub async fn list_bots(
        &self,
        ctx: &SecurityContext,
        page: PageRequest,
    ) -> Result<Vec<Bot>, DomainError> {
        tracing::debug!(principal_id = ctx.principal_id(), "listing bots");
        let rows = self
            .list_owned::<bot::Entity>(&AccessScope::owned_by(ctx), BOT, page)
            .await?;
        Ok(rows.into_iter().map(Bot::from).collect())
    }

    /// # Errors
    /// Returns `DomainError::NotFound` when the bot is missing or not owned by the caller.
    pub async fn get_bot(&self, ctx: &SecurityContext, id: i64) -> Result<Bot, DomainError> {
        self.get_owned::<bot::Entity>(ctx, BOT, id)
            .await
            .map(Bot::from)
    }

    /// # Errors
    /// Returns `DomainError::Validation` for invalid input, or `DomainError::Database`.
    pub async fn create_bot(&self, ctx: &SecurityContext, new_bot: NewBot) -> Result<Bot, DomainError> {
        let NewBot {
            name,
            platform_token,
            description,
        } = new_bot;
        let name = required_text("name", &name, self.config.max_name_length)?;
        let platform_token = required_text("platform_token", &platform_token, MAX_TOKEN_LENGTH)?;
        let description =
            optional_text("description", description.as_deref(), MAX_DESCRIPTION_LENGTH)?;

        let am = bot::ActiveModel {
            name: Set(name),
            platform_token: Set(platform_token),
            description: Set(description),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            ..Default::default()
        };

        let created = self
            .create_owned::<bot::Entity>(ctx, BOT, am, |m| m.id)
            .await?;
        tracing::info!(
            bot_id = created.id,
            principal_id = ctx.principal_id(),
            "bot created"
        );
        Ok(Bot::from(created))
    }

    /// Apply `patch` to an owned bot in one owner-guarded statement.
    ///
    /// # Errors
    /// Returns `DomainError::NotFound` when the bot is missing or not owned by
    /// the caller, `DomainError::Validation` for invalid input.
    pub async fn update_bot(
        &self,
        ctx: &SecurityContext,
        id: i64,
        patch: BotPatch,
    ) -> Result<Bot, DomainError> {
        let mut am = bot::ActiveModel {
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        let BotPatch {
            name,
            platform_token,
            description,
            is_active,
        } = patch;
        let mut changed = Vec::new();
        if let Some(name) = name {
            am.name = Set(required_text("name", &name, self.config.max_name_length)?);
            changed.push("name");
        }
        if let Some(token) = platform_token {
            am.platform_token = Set(required_text("platform_token", &token, MAX_TOKEN_LENGTH)?);
            changed.push("platform_token");
        }
        if let Some(description) = description {
            am.description = Set(optional_text(
                "description",
                Some(&description),
                MAX_DESCRIPTION_LENGTH,
            )?);
            changed.push("description");
        }
        if let Some(is_active) = is_active {
            am.is_active = Set(is_active);
            changed.push("is_active");
        }

        let result = self
            .sec
            .update_by_id::<bot::Entity>(&AccessScope::owned_by(ctx), id, am)
            .await
            .map(Bot::from)
            .map_err(|e| DomainError::from_scope(BOT, e));

        self.record_outcome(
            AuditEntry::for_context(ctx, AuditAction::Update, BOT)
                .resource_id(id)
                .description("update bot")
                .details(json!({ "fields": changed })),
            &result,
        )
        .await;
        result
    }

    /// # Errors
    /// Returns `DomainError::NotFound` when the bot is missing or not owned by the caller.
    pub async fn delete_bot(&self, ctx: &SecurityContext, id: i64) -> Result<(), DomainError> {
        self.delete_owned::<bot::Entity>(ctx, BOT, id).await
    }

    /// Every bot regardless of owner, for superusers only.
    ///
    /// Ordinary principals get `NotFound`, the same answer as for any hidden
    /// resource. Both grants and refusals are audited.
    ///
    /// # Errors
    /// Returns `DomainError::NotFound` for non-superusers, or `DomainError::Database`.
    pub async fn list_all_bots(
        &self,
        ctx: &SecurityContext,
        page: PageRequest,
    ) -> Result<Vec<Bot>, DomainError> {
        let entry = AuditEntry::for_context(ctx, AuditAction::SuperuserBypass, BOT)
            .description("list bots of all owners");

        let scope = match AccessScope::superuser_bypass(ctx) {
            Ok(scope) => scope,
            Err(e) => {
                self.audit.record(entry.failed(&e)).await;
                return Err(DomainError::not_found(BOT));
            }
        };
        let result: Result<Vec<Bot>, DomainError> = self
            .list_owned::<bot::Entity>(&scope, BOT, page)
            .await
            .map(|rows| rows.into_iter().map(Bot::from).collect());
        self.record_outcome(entry, &result).await;
        result
    }
}
