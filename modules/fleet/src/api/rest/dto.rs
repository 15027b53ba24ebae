use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::model::{
    Bot, BotPatch, Flow, Lead, NewBot, NewFlow, NewLead, NewTrackingLink, PageRequest,
    TrackingLink,
};

/// `?limit=&offset=` on list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl From<ListQuery> for PageRequest {
    fn from(q: ListQuery) -> Self {
        Self {
            limit: q.limit,
            offset: q.offset,
        }
    }
}

/// Only the last four characters of a platform token leave the server.
fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    let tail: String = token.chars().skip(count.saturating_sub(4)).collect();
    format!("****{tail}")
}

// ==================== Bot DTOs ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotDto {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub name: String,
    pub platform_token_hint: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBotReq {
    pub name: String,
    pub platform_token: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// REST DTO for updating a bot (partial)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBotReq {
    pub name: Option<String>,
    pub platform_token: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl From<Bot> for BotDto {
    fn from(bot: Bot) -> Self {
        Self {
            id: bot.id,
            owner_id: bot.owner_id,
            platform_token_hint: mask_token(&bot.platform_token),
            name: bot.name,
            description: bot.description,
            is_active: bot.is_active,
            created_at: bot.created_at,
            updated_at: bot.updated_at,
        }
    }
}

impl From<CreateBotReq> for NewBot {
    fn from(req: CreateBotReq) -> Self {
        Self {
            name: req.name,
            platform_token: req.platform_token,
            description: req.description,
        }
    }
}

impl From<UpdateBotReq> for BotPatch {
    fn from(req: UpdateBotReq) -> Self {
        Self {
            name: req.name,
            platform_token: req.platform_token,
            description: req.description,
            is_active: req.is_active,
        }
    }
}

// ==================== Lead DTOs ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadDto {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub bot_id: Option<i64>,
    pub external_user_id: String,
    pub display_name: Option<String>,
    pub stage: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeadReq {
    #[serde(default)]
    pub bot_id: Option<i64>,
    pub external_user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
}

impl From<Lead> for LeadDto {
    fn from(lead: Lead) -> Self {
        Self {
            id: lead.id,
            owner_id: lead.owner_id,
            bot_id: lead.bot_id,
            external_user_id: lead.external_user_id,
            display_name: lead.display_name,
            stage: lead.stage,
            created_at: lead.created_at,
        }
    }
}

impl From<CreateLeadReq> for NewLead {
    fn from(req: CreateLeadReq) -> Self {
        Self {
            bot_id: req.bot_id,
            external_user_id: req.external_user_id,
            display_name: req.display_name,
            stage: req.stage,
        }
    }
}

// ==================== Flow DTOs ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDto {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub bot_id: Option<i64>,
    pub name: String,
    pub definition: Option<Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFlowReq {
    #[serde(default)]
    pub bot_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub definition: Option<Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl From<Flow> for FlowDto {
    fn from(flow: Flow) -> Self {
        Self {
            id: flow.id,
            owner_id: flow.owner_id,
            bot_id: flow.bot_id,
            name: flow.name,
            definition: flow.definition,
            is_active: flow.is_active,
            created_at: flow.created_at,
        }
    }
}

impl From<CreateFlowReq> for NewFlow {
    fn from(req: CreateFlowReq) -> Self {
        Self {
            bot_id: req.bot_id,
            name: req.name,
            definition: req.definition,
            is_active: req.is_active,
        }
    }
}

// ==================== Tracking link DTOs ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingLinkDto {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub bot_id: Option<i64>,
    pub slug: String,
    pub target_url: String,
    pub clicks: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrackingLinkReq {
    #[serde(default)]
    pub bot_id: Option<i64>,
    pub slug: String,
    pub target_url: String,
}

impl From<TrackingLink> for TrackingLinkDto {
    fn from(link: TrackingLink) -> Self {
        Self {
            id: link.id,
            owner_id: link.owner_id,
            bot_id: link.bot_id,
            slug: link.slug,
            target_url: link.target_url,
            clicks: link.clicks,
            created_at: link.created_at,
        }
    }
}

impl From<CreateTrackingLinkReq> for NewTrackingLink {
    fn from(req: CreateTrackingLinkReq) -> Self {
        Self {
            bot_id: req.bot_id,
            slug: req.slug,
            target_url: req.target_url,
        }
    }
}
