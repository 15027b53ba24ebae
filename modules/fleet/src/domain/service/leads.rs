use botfleet_db::secure::{AccessScope, SecurityContext};
use chrono::Utc;
use sea_orm::ActiveValue::Set;

use super::{FleetService, LEAD, optional_text, required_text};
use crate::domain::error::DomainError;
use crate::domain::model::{Lead, NewLead, PageRequest};
use crate::infra::storage::entity::lead;

const DEFAULT_STAGE: &str = "new";
const MAX_STAGE_LENGTH: usize = 64;

impl FleetService {
    /// # Errors
    /// Returns `DomainError::Database` if the query fails.
    pub async fn list_leads(
        &self,
        ctx: &SecurityContext,
        page: PageRequest,
    ) -> Result<Vec<Lead>, DomainError> {
        let rows = self
            .list_owned::<lead::Entity>(&AccessScope::owned_by(ctx), LEAD, page)
            .await?;
        Ok(rows.into_iter().map(Lead::from).collect())
    }

    /// # Errors
    /// Returns `DomainError::NotFound` when the lead is missing or not owned by the caller.
    pub async fn get_lead(&self, ctx: &SecurityContext, id: i64) -> Result<Lead, DomainError> {
        self.get_owned::<lead::Entity>(ctx, LEAD, id)
            .await
            .map(Lead::from)
    }

    /// # Errors
    /// Returns `DomainError::Validation` for invalid input or a `bot_id` the
    /// caller does not own.
    pub async fn create_lead(&self, ctx: &SecurityContext, new_lead: NewLead) -> Result<Lead, DomainError> {
        let NewLead {
            bot_id,
            external_user_id,
            display_name,
            stage,
        } = new_lead;
        let max = self.config.max_name_length;
        let external_user_id = required_text("external_user_id", &external_user_id, max)?;
        let display_name = optional_text("display_name", display_name.as_deref(), max)?;
        let stage = optional_text("stage", stage.as_deref(), MAX_STAGE_LENGTH)?
            .unwrap_or_else(|| DEFAULT_STAGE.to_owned());
        self.ensure_own_bot(ctx, bot_id).await?;

        let am = lead::ActiveModel {
            bot_id: Set(bot_id),
            external_user_id: Set(external_user_id),
            display_name: Set(display_name),
            stage: Set(stage),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        self.create_owned::<lead::Entity>(ctx, LEAD, am, |m| m.id)
            .await
            .map(Lead::from)
    }

    /// # Errors
    /// Returns `DomainError::NotFound` when the lead is missing or not owned by the caller.
    pub async fn delete_lead(&self, ctx: &SecurityContext, id: i64) -> Result<(), DomainError> {
        self.delete_owned::<lead::Entity>(ctx, LEAD, id).await
    }
}
