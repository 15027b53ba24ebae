//! Domain models and the mapping from storage rows.

use botfleet_security::PrincipalId;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::infra::storage::entity::{bot, flow, lead, tracking_link};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bot {
    pub id: i64,
    pub owner_id: Option<PrincipalId>,
    pub name: String,
    pub platform_token: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
pub struct NewBot {
    pub name: String,
    pub platform_token: String,
    pub description: Option<String>,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Clone, Debug, Default)]
pub struct BotPatch {
    pub name: Option<String>,
    pub platform_token: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lead {
    pub id: i64,
    pub owner_id: Option<PrincipalId>,
    pub bot_id: Option<i64>,
    pub external_user_id: String,
    pub display_name: Option<String>,
    pub stage: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewLead {
    pub bot_id: Option<i64>,
    pub external_user_id: String,
    pub display_name: Option<String>,
    pub stage: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flow {
    pub id: i64,
    pub owner_id: Option<PrincipalId>,
    pub bot_id: Option<i64>,
    pub name: String,
    pub definition: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewFlow {
    pub bot_id: Option<i64>,
    pub name: String,
    pub definition: Option<Value>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingLink {
    pub id: i64,
    pub owner_id: Option<PrincipalId>,
    pub bot_id: Option<i64>,
    pub slug: String,
    pub target_url: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct NewTrackingLink {
    pub bot_id: Option<i64>,
    pub slug: String,
    pub target_url: String,
}

/// Requested list window. Missing values fall back to the service defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl From<bot::Model> for Bot {
    fn from(m: bot::Model) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            name: m.name,
            platform_token: m.platform_token,
            description: m.description,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<lead::Model> for Lead {
    fn from(m: lead::Model) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            bot_id: m.bot_id,
            external_user_id: m.external_user_id,
            display_name: m.display_name,
            stage: m.stage,
            created_at: m.created_at,
        }
    }
}

impl From<flow::Model> for Flow {
    fn from(m: flow::Model) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            bot_id: m.bot_id,
            name: m.name,
            definition: m.definition,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

impl From<tracking_link::Model> for TrackingLink {
    fn from(m: tracking_link::Model) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            bot_id: m.bot_id,
            slug: m.slug,
            target_url: m.target_url,
            clicks: m.clicks,
            created_at: m.created_at,
        }
    }
}
