//! 应用层错误定义
//!
//! 定义应用层特定的错误类型。业务失败在单个操作内部被归约为
//! 结构化错误返回，不会以 panic 形式越过服务边界；只有存储层
//! 不可用会作为硬错误向上传播。

use chrono::{DateTime, Utc};
use domain::{ApplicationId, DomainError, PeriodId, RepositoryError};
use thiserror::Error;

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 申请提交相关错误
    #[error("提交错误: {0}")]
    Submission(#[from] SubmissionError),

    /// 投票相关错误
    #[error("投票错误: {0}")]
    Vote(#[from] VoteError),

    /// 周期相关错误
    #[error("周期错误: {0}")]
    Period(#[from] PeriodError),

    /// 领域层错误
    #[error("领域错误: {0}")]
    Domain(#[from] DomainError),

    /// 存储层错误
    #[error("存储层错误: {0}")]
    Repository(#[from] RepositoryError),

    /// 未找到资源
    #[error("资源未找到: {0}")]
    NotFound(String),
}

/// 应用层结果类型
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// 申请提交错误
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// 校验未通过，携带全部违反的规则，便于提交者一次改完
    #[error("提交校验未通过: {}", .errors.join("；"))]
    Invalid { errors: Vec<String> },
}

/// 投票服务错误
#[derive(Debug, Error)]
pub enum VoteError {
    /// 今天已投过票
    #[error("今天已投过票，下次可投时间: {next_vote_time}")]
    AlreadyVotedToday { next_vote_time: DateTime<Utc> },

    /// 投票目标不存在或未开放投票
    #[error("投票目标不可用: {0}")]
    IneligibleTarget(ApplicationId),
}

/// 周期服务错误
#[derive(Debug, Error)]
pub enum PeriodError {
    /// 周期不存在
    #[error("周期不存在: {0}")]
    NotFound(PeriodId),

    /// 当前状态不允许该迁移
    #[error("周期状态不允许该操作: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// 已存在活跃周期
    #[error("已存在活跃周期")]
    ActivePeriodExists,

    /// 没有活跃周期
    #[error("没有活跃的投票周期")]
    NoActivePeriod,
}
