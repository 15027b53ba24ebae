use botfleet_db::secure::{AccessScope, SecurityContext};
use chrono::Utc;
use sea_orm::ActiveValue::Set;

use super::{FLOW, FleetService, required_text};
use crate::domain::error::DomainError;
use crate::domain::model::{Flow, NewFlow, PageRequest};
use crate::infra::storage::entity::flow;

impl FleetService {
    /// # Errors
    /// Returns `DomainError::Database` if the query fails.
    pub async fn list_flows(
        &self,
        ctx: &SecurityContext,
        page: PageRequest,
    ) -> Result<Vec<Flow>, DomainError> {
        let rows = self
            .list_owned::<flow::Entity>(&AccessScope::owned_by(ctx), FLOW, page)
            .await?;
        Ok(rows.into_iter().map(Flow::from).collect())
    }

    /// # Errors
    /// Returns `DomainError::NotFound` when the flow is missing or not owned by the caller.
    pub async fn get_flow(&self, ctx: &SecurityContext, id: i64) -> Result<Flow, DomainError> {
        self.get_owned::<flow::Entity>(ctx, FLOW, id)
            .await
            .map(Flow::from)
    }

    /// The flow definition is stored as given; its semantics belong to the bot runtime.
    ///
    /// # Errors
    /// Returns `DomainError::Validation` for invalid input or a `bot_id` the
    /// caller does not own.
    pub async fn create_flow(&self, ctx: &SecurityContext, new_flow: NewFlow) -> Result<Flow, DomainError> {
        let NewFlow {
            bot_id,
            name,
            definition,
            is_active,
        } = new_flow;
        let name = required_text("name", &name, self.config.max_name_length)?;
        if let Some(definition) = &definition
            && !(definition.is_object() || definition.is_array())
        {
            return Err(DomainError::validation(
                "definition",
                "must be a JSON object or array",
            ));
        }
        self.ensure_own_bot(ctx, bot_id).await?;

        let am = flow::ActiveModel {
            bot_id: Set(bot_id),
            name: Set(name),
            definition: Set(definition),
            is_active: Set(is_active.unwrap_or(true)),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        self.create_owned::<flow::Entity>(ctx, FLOW, am, |m| m.id)
            .await
            .map(Flow::from)
    }

    /// # Errors
    /// Returns `DomainError::NotFound` when the flow is missing or not owned by the caller.
    pub async fn delete_flow(&self, ctx: &SecurityContext, id: i64) -> Result<(), DomainError> {
        self.delete_owned::<flow::Entity>(ctx, FLOW, id).await
    }
}
