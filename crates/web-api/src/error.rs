use application::{ApplicationError, PeriodError, SubmissionError, VoteError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use domain::RepositoryError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    /// 提交校验失败时的完整规则清单
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// 今天已投票时的下一次可投时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_vote_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
                errors: None,
                next_vote_time: None,
            },
        }
    }

    // 添加便利方法
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.body.errors = Some(errors);
        self
    }

    fn with_next_vote_time(mut self, next_vote_time: DateTime<Utc>) -> Self {
        self.body.next_vote_time = Some(next_vote_time);
        self
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Submission(SubmissionError::Invalid { errors }) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                "提交校验未通过，请修正全部问题后重试",
            )
            .with_errors(errors),

            ApplicationError::Vote(VoteError::AlreadyVotedToday { next_vote_time }) => {
                ApiError::new(
                    StatusCode::CONFLICT,
                    "ALREADY_VOTED_TODAY",
                    "今天已投过票，明天可以再来",
                )
                .with_next_vote_time(next_vote_time)
            }

            ApplicationError::Vote(VoteError::IneligibleTarget(id)) => ApiError::new(
                StatusCode::BAD_REQUEST,
                "INELIGIBLE_TARGET",
                format!("申请 {} 不存在或未开放投票", id),
            ),

            ApplicationError::Period(PeriodError::NotFound(id)) => ApiError::new(
                StatusCode::NOT_FOUND,
                "PERIOD_NOT_FOUND",
                format!("周期不存在: {}", id),
            ),

            ApplicationError::Period(PeriodError::InvalidTransition { from, to }) => ApiError::new(
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                format!("周期状态不允许该操作: {} -> {}", from, to),
            ),

            ApplicationError::Period(PeriodError::ActivePeriodExists) => ApiError::new(
                StatusCode::CONFLICT,
                "ACTIVE_PERIOD_EXISTS",
                "已存在活跃周期，先结束当前周期",
            ),

            ApplicationError::Period(PeriodError::NoActivePeriod) => ApiError::new(
                StatusCode::NOT_FOUND,
                "NO_ACTIVE_PERIOD",
                "没有活跃的投票周期",
            ),

            ApplicationError::Domain(err) => {
                ApiError::new(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", err.to_string())
            }

            ApplicationError::NotFound(message) => {
                ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }

            ApplicationError::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                RepositoryError::Storage { message } => ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    format!("database error: {}", message),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
