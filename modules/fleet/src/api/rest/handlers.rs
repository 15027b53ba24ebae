use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use botfleet_auth::Authz;
use serde::Serialize;
use tracing::info;

use super::dto::{
    BotDto, CreateBotReq, CreateFlowReq, CreateLeadReq, CreateTrackingLinkReq, FlowDto, LeadDto,
    ListQuery, TrackingLinkDto, UpdateBotReq,
};
use super::error::ApiResult;
use crate::domain::FleetService;

type Svc = State<Arc<FleetService>>;

/// 201 Created + JSON with Location header
fn created_json<T: Serialize>(value: T, uri: &Uri, new_id: i64) -> Response {
    let location = format!("{}/{new_id}", uri.path().trim_end_matches('/'));
    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(value),
    )
        .into_response()
}

#[allow(clippy::unused_async)] // axum handlers are async
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ==================== Bots ====================

pub async fn list_bots(
    Authz(ctx): Authz,
    State(svc): Svc,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<BotDto>>> {
    let bots = svc.list_bots(&ctx, q.into()).await?;
    Ok(Json(bots.into_iter().map(BotDto::from).collect()))
}

pub async fn get_bot(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
) -> ApiResult<Json<BotDto>> {
    Ok(Json(svc.get_bot(&ctx, id).await?.into()))
}

pub async fn create_bot(
    uri: Uri,
    Authz(ctx): Authz,
    State(svc): Svc,
    Json(req): Json<CreateBotReq>,
) -> ApiResult<Response> {
    let bot = svc.create_bot(&ctx, req.into()).await?;
    let id = bot.id;
    Ok(created_json(BotDto::from(bot), &uri, id))
}

pub async fn update_bot(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBotReq>,
) -> ApiResult<Json<BotDto>> {
    info!(
        bot_id = id,
        updater_id = ctx.principal_id(),
        "Updating bot"
    );
    Ok(Json(svc.update_bot(&ctx, id, req.into()).await?.into()))
}

pub async fn delete_bot(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    info!(
        bot_id = id,
        deleter_id = ctx.principal_id(),
        "Deleting bot"
    );
    svc.delete_bot(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_all_bots(
    Authz(ctx): Authz,
    State(svc): Svc,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<BotDto>>> {
    let bots = svc.list_all_bots(&ctx, q.into()).await?;
    Ok(Json(bots.into_iter().map(BotDto::from).collect()))
}

// ==================== Leads ====================

pub async fn list_leads(
    Authz(ctx): Authz,
    State(svc): Svc,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<LeadDto>>> {
    let leads = svc.list_leads(&ctx, q.into()).await?;
    Ok(Json(leads.into_iter().map(LeadDto::from).collect()))
}

pub async fn get_lead(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
) -> ApiResult<Json<LeadDto>> {
    Ok(Json(svc.get_lead(&ctx, id).await?.into()))
}

pub async fn create_lead(
    uri: Uri,
    Authz(ctx): Authz,
    State(svc): Svc,
    Json(req): Json<CreateLeadReq>,
) -> ApiResult<Response> {
    let lead = svc.create_lead(&ctx, req.into()).await?;
    let id = lead.id;
    Ok(created_json(LeadDto::from(lead), &uri, id))
}

pub async fn delete_lead(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    svc.delete_lead(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Flows ====================

pub async fn list_flows(
    Authz(ctx): Authz,
    State(svc): Svc,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<FlowDto>>> {
    let flows = svc.list_flows(&ctx, q.into()).await?;
    Ok(Json(flows.into_iter().map(FlowDto::from).collect()))
}

pub async fn get_flow(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
) -> ApiResult<Json<FlowDto>> {
    Ok(Json(svc.get_flow(&ctx, id).await?.into()))
}

pub async fn create_flow(
    uri: Uri,
    Authz(ctx): Authz,
    State(svc): Svc,
    Json(req): Json<CreateFlowReq>,
) -> ApiResult<Response> {
    let flow = svc.create_flow(&ctx, req.into()).await?;
    let id = flow.id;
    Ok(created_json(FlowDto::from(flow), &uri, id))
}

pub async fn delete_flow(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    svc.delete_flow(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Tracking links ====================

pub async fn list_tracking_links(
    Authz(ctx): Authz,
    State(svc): Svc,
    Query(q): Query<ListQuery>,
) -> ApiResult<Json<Vec<TrackingLinkDto>>> {
    let links = svc.list_tracking_links(&ctx, q.into()).await?;
    Ok(Json(links.into_iter().map(TrackingLinkDto::from).collect()))
}

pub async fn get_tracking_link(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
) -> ApiResult<Json<TrackingLinkDto>> {
    Ok(Json(svc.get_tracking_link(&ctx, id).await?.into()))
}

pub async fn create_tracking_link(
    uri: Uri,
    Authz(ctx): Authz,
    State(svc): Svc,
    Json(req): Json<CreateTrackingLinkReq>,
) -> ApiResult<Response> {
    let link = svc.create_tracking_link(&ctx, req.into()).await?;
    let id = link.id;
    Ok(created_json(TrackingLinkDto::from(link), &uri, id))
}

pub async fn delete_tracking_link(
    Authz(ctx): Authz,
    State(svc): Svc,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    svc.delete_tracking_link(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
