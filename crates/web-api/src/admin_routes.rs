//! 管理员路由：审核、抽选、周期控制与统计报表
//!
//! 所有路由都要求 `Authorization: Bearer <token>`，令牌比较
//! 使用常量时间比较，避免旁路泄露。

use axum::{
    extract::{Path, Request, State},
    http::header,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::{Application, ApplicationId, VotingPeriod};

use crate::{error::ApiError, state::AppState};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications))
        .route("/applications/{id}/approve", post(approve_application))
        .route("/applications/{id}/reject", post(reject_application))
        .route("/selection", post(run_selection))
        .route("/period/start-voting", post(start_voting))
        .route("/period/end", post(end_voting))
        .route("/period", post(new_period))
        .route("/stats", get(admin_stats))
}

/// 管理端鉴权中间件
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if constant_time_eq(token.as_bytes(), state.admin_token.as_bytes()) => {
            Ok(next.run(request).await)
        }
        _ => Err(ApiError::unauthorized("管理员令牌无效")),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    ring::constant_time::verify_slices_are_equal(a, b).is_ok()
}

/// 管理端申请视图（含联系方式）
#[derive(Debug, Serialize)]
struct AdminApplication {
    id: Uuid,
    description: String,
    amount: f64,
    country: String,
    contact: Option<String>,
    status: &'static str,
    votes_count: i64,
    period_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<&Application> for AdminApplication {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id.into(),
            description: application.description.clone(),
            amount: application.amount,
            country: application.country.clone(),
            contact: application.contact.clone(),
            status: application.status.as_str(),
            votes_count: application.votes_count,
            period_id: application.period_id.map(Uuid::from),
            created_at: application.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct PeriodView {
    id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: &'static str,
    winner_id: Option<Uuid>,
}

impl From<&VotingPeriod> for PeriodView {
    fn from(period: &VotingPeriod) -> Self {
        Self {
            id: period.id.into(),
            start_date: period.start_date,
            end_date: period.end_date,
            status: period.status.as_str(),
            winner_id: period.winner_id.map(Uuid::from),
        }
    }
}

#[derive(Debug, Serialize)]
struct AdminApplicationsResponse {
    applications: Vec<AdminApplication>,
    period: Option<PeriodView>,
    total_votes: u64,
    approved_count: u64,
    pending_count: u64,
}

/// GET /api/admin/applications - 全部申请与当前周期概览
async fn list_applications(
    State(state): State<AppState>,
) -> Result<Json<AdminApplicationsResponse>, ApiError> {
    let applications = state.application_service.all_applications().await?;
    let snapshot = state.period_service.period_snapshot().await?;

    Ok(Json(AdminApplicationsResponse {
        applications: applications.iter().map(AdminApplication::from).collect(),
        period: snapshot.period.as_ref().map(PeriodView::from),
        total_votes: snapshot.total_votes,
        approved_count: snapshot.approved_count,
        pending_count: snapshot.pending_count,
    }))
}

#[derive(Debug, Serialize)]
struct ModerationResponse {
    success: bool,
    application: AdminApplication,
}

/// POST /api/admin/applications/{id}/approve
async fn approve_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModerationResponse>, ApiError> {
    let application = state
        .application_service
        .approve(ApplicationId::from(id))
        .await?;
    Ok(Json(ModerationResponse {
        success: true,
        application: AdminApplication::from(&application),
    }))
}

/// POST /api/admin/applications/{id}/reject
async fn reject_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ModerationResponse>, ApiError> {
    let application = state
        .application_service
        .reject(ApplicationId::from(id))
        .await?;
    Ok(Json(ModerationResponse {
        success: true,
        application: AdminApplication::from(&application),
    }))
}

#[derive(Debug, Deserialize, Default)]
struct SelectionRequest {
    count: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SelectionResponse {
    success: bool,
    selected: u64,
    message: String,
    period_id: Uuid,
}

/// POST /api/admin/selection - 随机抽选进入当前周期
async fn run_selection(
    State(state): State<AppState>,
    request: Option<Json<SelectionRequest>>,
) -> Result<Json<SelectionResponse>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let period = state.period_service.get_or_create_active_period().await?;
    let count = request.count.unwrap_or(state.default_selection_count);
    let outcome = state
        .selection_service
        .select_random(count, period.id)
        .await?;

    Ok(Json(SelectionResponse {
        success: outcome.success,
        selected: outcome.selected,
        message: outcome.message,
        period_id: period.id.into(),
    }))
}

#[derive(Debug, Serialize)]
struct PeriodResponse {
    success: bool,
    period: PeriodView,
    message: String,
}

/// POST /api/admin/period/start-voting - 当前周期进入投票阶段
async fn start_voting(State(state): State<AppState>) -> Result<Json<PeriodResponse>, ApiError> {
    let period = state.period_service.get_or_create_active_period().await?;
    let updated = state.period_service.start_voting(period.id).await?;

    Ok(Json(PeriodResponse {
        success: true,
        period: PeriodView::from(&updated),
        message: "投票已启动".to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct EndVotingResponse {
    success: bool,
    period: PeriodView,
    winner: Option<AdminApplication>,
    message: String,
}

/// POST /api/admin/period/end - 结算当前周期
async fn end_voting(State(state): State<AppState>) -> Result<Json<EndVotingResponse>, ApiError> {
    let active = state
        .period_service
        .active_period()
        .await?
        .ok_or_else(|| ApiError::not_found("没有活跃的投票周期"))?;

    let closure = state.period_closer.end_period(active.id).await?;

    let message = match &closure.winner {
        Some(winner) => format!("投票已结束，胜出申请金额 {} 美元", winner.amount),
        None => "投票已结束，本期没有胜出者".to_string(),
    };

    Ok(Json(EndVotingResponse {
        success: true,
        period: PeriodView::from(&closure.period),
        winner: closure.winner.as_ref().map(AdminApplication::from),
        message,
    }))
}

#[derive(Debug, Deserialize, Default)]
struct NewPeriodRequest {
    duration_days: Option<i64>,
}

/// POST /api/admin/period - 开启新的收集周期
async fn new_period(
    State(state): State<AppState>,
    request: Option<Json<NewPeriodRequest>>,
) -> Result<Json<PeriodResponse>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let period = state
        .period_closer
        .create_new_period(request.duration_days)
        .await?;

    Ok(Json(PeriodResponse {
        success: true,
        period: PeriodView::from(&period),
        message: "新周期已创建".to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct StatusCounts {
    total: u64,
    pending: u64,
    approved: u64,
    selected: u64,
    rejected: u64,
    winners: u64,
    total_votes: u64,
}

#[derive(Debug, Serialize)]
struct CountryStat {
    country: String,
    count: u64,
}

#[derive(Debug, Serialize)]
struct CompletedPeriodView {
    id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    winner: Option<AdminApplication>,
}

#[derive(Debug, Serialize)]
struct AdminStatsResponse {
    stats: StatusCounts,
    by_country: Vec<CountryStat>,
    completed_periods: Vec<CompletedPeriodView>,
    recent_applications: Vec<AdminApplication>,
}

/// GET /api/admin/stats - 管理端统计报表
async fn admin_stats(State(state): State<AppState>) -> Result<Json<AdminStatsResponse>, ApiError> {
    let statistics = state.application_service.statistics().await?;
    let total_votes = state.vote_service.total_votes(None).await?;
    let by_country = state.application_service.country_breakdown(10).await?;
    let recent = state.application_service.recent_applications(10).await?;
    let completed = state.period_service.completed_periods(5).await?;

    let mut completed_periods = Vec::with_capacity(completed.len());
    for period in &completed {
        let winner = match period.winner_id {
            Some(winner_id) => state.application_service.find_application(winner_id).await?,
            None => None,
        };
        completed_periods.push(CompletedPeriodView {
            id: period.id.into(),
            start_date: period.start_date,
            end_date: period.end_date,
            winner: winner.as_ref().map(AdminApplication::from),
        });
    }

    Ok(Json(AdminStatsResponse {
        stats: StatusCounts {
            total: statistics.total,
            pending: statistics.pending,
            approved: statistics.approved,
            selected: statistics.selected,
            rejected: statistics.rejected,
            winners: statistics.winners,
            total_votes,
        },
        by_country: by_country
            .into_iter()
            .map(|c| CountryStat {
                country: c.country,
                count: c.count,
            })
            .collect(),
        completed_periods,
        recent_applications: recent.iter().map(AdminApplication::from).collect(),
    }))
}
