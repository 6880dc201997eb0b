//! 公共路由：提交申请、查看选票、投票、公开统计

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use application::SubmitApplicationRequest;
use domain::{Application, ApplicationId};

use crate::{error::ApiError, state::AppState};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/applications",
            get(list_selected_applications).post(submit_application),
        )
        .route("/vote", post(cast_vote).get(voting_status))
        .route("/stats", get(public_stats))
}

/// 对外公开的申请视图（不含联系方式）
#[derive(Debug, Serialize)]
struct PublicApplication {
    id: Uuid,
    description: String,
    amount: f64,
    country: String,
    status: &'static str,
    votes_count: i64,
    created_at: DateTime<Utc>,
}

impl From<&Application> for PublicApplication {
    fn from(application: &Application) -> Self {
        Self {
            id: application.id.into(),
            description: application.description.clone(),
            amount: application.amount,
            country: application.country.clone(),
            status: application.status.as_str(),
            votes_count: application.votes_count,
            created_at: application.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    success: bool,
    application: PublicApplication,
    message: String,
}

/// POST /api/applications - 提交新申请
async fn submit_application(
    State(state): State<AppState>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let application = state.application_service.submit(request).await?;

    Ok(Json(SubmitResponse {
        success: true,
        application: PublicApplication::from(&application),
        message: "申请已提交，将由管理员审核".to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct BallotResponse {
    applications: Vec<PublicApplication>,
    total_submitted: u64,
    total_votes: u64,
    period_end: Option<DateTime<Utc>>,
}

/// GET /api/applications - 当前选票（入选申请按票数降序）
async fn list_selected_applications(
    State(state): State<AppState>,
) -> Result<Json<BallotResponse>, ApiError> {
    let snapshot = state.period_service.period_snapshot().await?;

    Ok(Json(BallotResponse {
        applications: snapshot.selected.iter().map(PublicApplication::from).collect(),
        total_submitted: snapshot.total_applications,
        total_votes: snapshot.total_votes,
        period_end: snapshot.period.map(|p| p.end_date),
    }))
}

#[derive(Debug, Deserialize)]
struct VoteRequest {
    visitor_hash: String,
    application_id: Uuid,
}

#[derive(Debug, Serialize)]
struct VoteResponse {
    success: bool,
    message: String,
    application_id: Uuid,
    next_vote_time: DateTime<Utc>,
}

/// POST /api/vote - 投票
async fn cast_vote(
    State(state): State<AppState>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let period = state.period_service.get_or_create_active_period().await?;
    let outcome = state
        .vote_service
        .cast_vote(
            &request.visitor_hash,
            ApplicationId::from(request.application_id),
            period.id,
        )
        .await?;

    Ok(Json(VoteResponse {
        success: true,
        message: outcome.message,
        application_id: outcome.application_id.into(),
        next_vote_time: outcome.next_vote_time,
    }))
}

#[derive(Debug, Deserialize)]
struct VoteStatusQuery {
    hash: String,
}

#[derive(Debug, Serialize)]
struct VoteStatusResponse {
    can_vote: bool,
    voted_today: bool,
    today_votes: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_vote_time: Option<DateTime<Utc>>,
}

/// GET /api/vote?hash=... - 查询访客今天的投票状态
async fn voting_status(
    State(state): State<AppState>,
    Query(query): Query<VoteStatusQuery>,
) -> Result<Json<VoteStatusResponse>, ApiError> {
    let period = state.period_service.get_or_create_active_period().await?;
    let status = state
        .vote_service
        .voting_status(&query.hash, period.id)
        .await?;

    Ok(Json(VoteStatusResponse {
        can_vote: status.can_vote,
        voted_today: status.voted_today,
        today_votes: status.today_votes.into_iter().map(Uuid::from).collect(),
        next_vote_time: status.next_vote_time,
    }))
}

#[derive(Debug, Serialize)]
struct PublicStats {
    total_applications: u64,
    total_countries: u64,
    total_votes: u64,
    last_updated: DateTime<Utc>,
}

/// GET /api/stats - 公开的全局统计
async fn public_stats(State(state): State<AppState>) -> Result<Json<PublicStats>, ApiError> {
    let statistics = state.application_service.statistics().await?;
    let total_countries = state.application_service.distinct_countries().await?;
    let total_votes = state.vote_service.total_votes(None).await?;

    Ok(Json(PublicStats {
        total_applications: statistics.total,
        total_countries,
        total_votes,
        last_updated: Utc::now(),
    }))
}
