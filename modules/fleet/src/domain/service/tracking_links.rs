use botfleet_db::secure::{AccessScope, SecurityContext};
use chrono::Utc;
use sea_orm::ActiveValue::Set;

use super::{FleetService, TRACKING_LINK, required_text};
use crate::domain::error::DomainError;
use crate::domain::model::{NewTrackingLink, PageRequest, TrackingLink};
use crate::infra::storage::entity::tracking_link;

const MAX_SLUG_LENGTH: usize = 64;
const MAX_URL_LENGTH: usize = 2048;

fn validate_slug(slug: &str) -> Result<String, DomainError> {
    let slug = required_text("slug", slug, MAX_SLUG_LENGTH)?;
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(DomainError::validation(
            "slug",
            "only lowercase letters, digits, '-' and '_' are allowed",
        ));
    }
    Ok(slug)
}

fn validate_target_url(url: &str) -> Result<String, DomainError> {
    let url = required_text("target_url", url, MAX_URL_LENGTH)?;
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(DomainError::validation(
            "target_url",
            "must be an absolute http(s) URL",
        )),
    }
}

impl FleetService {
    /// # Errors
    /// Returns `DomainError::Database` if the query fails.
    pub async fn list_tracking_links(
        &self,
        ctx: &SecurityContext,
        page: PageRequest,
    ) -> Result<Vec<TrackingLink>, DomainError> {
        let rows = self
            .list_owned::<tracking_link::Entity>(&AccessScope::owned_by(ctx), TRACKING_LINK, page)
            .await?;
        Ok(rows.into_iter().map(TrackingLink::from).collect())
    }

    /// # Errors
    /// Returns `DomainError::NotFound` when the link is missing or not owned by the caller.
    pub async fn get_tracking_link(
        &self,
        ctx: &SecurityContext,
        id: i64,
    ) -> Result<TrackingLink, DomainError> {
        self.get_owned::<tracking_link::Entity>(ctx, TRACKING_LINK, id)
            .await
            .map(TrackingLink::from)
    }

    /// Slugs are unique across all owners.
    ///
    /// # Errors
    /// Returns `DomainError::Validation` for invalid input, `DomainError::Conflict`
    /// when the slug is taken.
    pub async fn create_tracking_link(
        &self,
        ctx: &SecurityContext,
        new_link: NewTrackingLink,
    ) -> Result<TrackingLink, DomainError> {
        let NewTrackingLink {
            bot_id,
            slug,
            target_url,
        } = new_link;
        let slug = validate_slug(&slug)?;
        let target_url = validate_target_url(&target_url)?;
        self.ensure_own_bot(ctx, bot_id).await?;

        let am = tracking_link::ActiveModel {
            bot_id: Set(bot_id),
            slug: Set(slug),
            target_url: Set(target_url),
            clicks: Set(0),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        self.create_owned::<tracking_link::Entity>(ctx, TRACKING_LINK, am, |m| m.id)
            .await
            .map(TrackingLink::from)
    }

    /// # Errors
    /// Returns `DomainError::NotFound` when the link is missing or not owned by the caller.
    pub async fn delete_tracking_link(&self, ctx: &SecurityContext, id: i64) -> Result<(), DomainError> {
        self.delete_owned::<tracking_link::Entity>(ctx, TRACKING_LINK, id)
            .await
    }
}
