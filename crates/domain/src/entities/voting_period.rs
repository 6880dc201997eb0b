//! 投票周期实体定义
//!
//! 周期状态机：COLLECTING -> VOTING -> COMPLETED，COMPLETED 为终态。
//! 全局同一时刻最多存在一个活跃周期（COLLECTING 或 VOTING）。

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::application::ApplicationId;
use crate::errors::{DomainError, DomainResult};

/// 周期唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodId(pub Uuid);

impl PeriodId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for PeriodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PeriodId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PeriodId> for Uuid {
    fn from(value: PeriodId) -> Self {
        value.0
    }
}

/// 周期状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodStatus {
    /// 收集申请中
    Collecting,
    /// 投票进行中
    Voting,
    /// 已结束
    Completed,
}

impl PeriodStatus {
    /// 存储层使用的状态字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodStatus::Collecting => "COLLECTING",
            PeriodStatus::Voting => "VOTING",
            PeriodStatus::Completed => "COMPLETED",
        }
    }

    /// 从存储层的状态字符串解析
    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "COLLECTING" => Ok(PeriodStatus::Collecting),
            "VOTING" => Ok(PeriodStatus::Voting),
            "COMPLETED" => Ok(PeriodStatus::Completed),
            other => Err(DomainError::invalid_argument(
                "period_status",
                format!("未知状态: {}", other),
            )),
        }
    }

    /// COLLECTING 和 VOTING 都视为活跃
    pub fn is_active(&self) -> bool {
        matches!(self, PeriodStatus::Collecting | PeriodStatus::Voting)
    }
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 投票周期实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingPeriod {
    /// 周期唯一ID
    pub id: PeriodId,
    /// 周期开始时间
    pub start_date: DateTime<Utc>,
    /// 周期计划结束时间（信息性字段，不自动触发结算）
    pub end_date: DateTime<Utc>,
    /// 周期状态
    pub status: PeriodStatus,
    /// 胜出申请，仅在 COMPLETED 且存在入选申请时非空
    pub winner_id: Option<ApplicationId>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl VotingPeriod {
    /// 开启一个新的收集周期
    pub fn open(now: DateTime<Utc>, duration_days: i64) -> Self {
        Self {
            id: PeriodId(Uuid::new_v4()),
            start_date: now,
            end_date: now + Duration::days(duration_days),
            status: PeriodStatus::Collecting,
            winner_id: None,
            created_at: now,
        }
    }

    /// 当前周期是否活跃
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// 启动投票：COLLECTING -> VOTING
    ///
    /// 对已处于 VOTING 的周期重复调用是无害的幂等操作；
    /// 对 COMPLETED 周期调用返回迁移错误。
    pub fn start_voting(&mut self) -> DomainResult<()> {
        match self.status {
            PeriodStatus::Collecting => {
                self.status = PeriodStatus::Voting;
                Ok(())
            }
            PeriodStatus::Voting => Ok(()),
            PeriodStatus::Completed => Err(DomainError::invalid_transition(
                self.status.to_string(),
                PeriodStatus::Voting.to_string(),
            )),
        }
    }

    /// 结束周期：VOTING -> COMPLETED，同时记录胜出者
    pub fn complete(&mut self, winner_id: Option<ApplicationId>) -> DomainResult<()> {
        if self.status != PeriodStatus::Voting {
            return Err(DomainError::invalid_transition(
                self.status.to_string(),
                PeriodStatus::Completed.to_string(),
            ));
        }
        self.status = PeriodStatus::Completed;
        self.winner_id = winner_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_period_is_collecting_with_configured_duration() {
        let now = Utc::now();
        let period = VotingPeriod::open(now, 30);

        assert_eq!(period.status, PeriodStatus::Collecting);
        assert_eq!(period.end_date - period.start_date, Duration::days(30));
        assert!(period.is_active());
        assert!(period.winner_id.is_none());
    }

    #[test]
    fn start_voting_is_idempotent() {
        let mut period = VotingPeriod::open(Utc::now(), 30);

        assert!(period.start_voting().is_ok());
        assert_eq!(period.status, PeriodStatus::Voting);

        // 重复启动不报错也不改变状态
        assert!(period.start_voting().is_ok());
        assert_eq!(period.status, PeriodStatus::Voting);
    }

    #[test]
    fn completed_period_cannot_restart_voting() {
        let mut period = VotingPeriod::open(Utc::now(), 30);
        period.start_voting().unwrap();
        period.complete(None).unwrap();

        assert!(period.start_voting().is_err());
    }

    #[test]
    fn complete_requires_voting_status() {
        let mut period = VotingPeriod::open(Utc::now(), 30);

        // 收集中的周期不能直接结算
        assert!(period.complete(None).is_err());

        period.start_voting().unwrap();
        let winner = ApplicationId(Uuid::new_v4());
        assert!(period.complete(Some(winner)).is_ok());
        assert_eq!(period.status, PeriodStatus::Completed);
        assert_eq!(period.winner_id, Some(winner));
        assert!(!period.is_active());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            PeriodStatus::Collecting,
            PeriodStatus::Voting,
            PeriodStatus::Completed,
        ] {
            assert_eq!(PeriodStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(PeriodStatus::parse("PAUSED").is_err());
    }
}
