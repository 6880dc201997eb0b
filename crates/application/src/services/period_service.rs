//! 投票周期管理服务
//!
//! 持有周期状态机（COLLECTING -> VOTING -> COMPLETED）的写入权，
//! 并提供周期维度的聚合查询。全局同一时刻最多一个活跃周期，
//! 该约束由存储层的部分唯一索引兜底，应用层的先查后建只是快速路径。

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use domain::{
    Application, ApplicationFilter, ApplicationRepository, PeriodId, PeriodRepository,
    PeriodStatus, RepositoryError, VotingPeriod,
};

use crate::clock::Clock;
use crate::errors::{ApplicationResult, PeriodError};

/// 周期快照：当前周期与它的选票盘面
#[derive(Debug, Clone, Serialize)]
pub struct PeriodSnapshot {
    /// 当前活跃周期；系统冷启动后尚未创建时为空
    pub period: Option<VotingPeriod>,
    /// 周期内入选申请，按票数降序
    pub selected: Vec<Application>,
    /// 入选申请的票数合计
    pub total_votes: u64,
    /// 系统内已批准申请总数
    pub approved_count: u64,
    /// 系统内待审核申请总数
    pub pending_count: u64,
    /// 系统内申请总数（含已归档）
    pub total_applications: u64,
}

/// 周期服务依赖
pub struct PeriodServiceDependencies {
    pub period_repository: Arc<dyn PeriodRepository>,
    pub application_repository: Arc<dyn ApplicationRepository>,
    pub clock: Arc<dyn Clock>,
    /// 新周期的默认持续天数
    pub period_duration_days: i64,
}

/// 投票周期管理服务
pub struct PeriodService {
    periods: Arc<dyn PeriodRepository>,
    applications: Arc<dyn ApplicationRepository>,
    clock: Arc<dyn Clock>,
    period_duration_days: i64,
}

impl PeriodService {
    pub fn new(deps: PeriodServiceDependencies) -> Self {
        Self {
            periods: deps.period_repository,
            applications: deps.application_repository,
            clock: deps.clock,
            period_duration_days: deps.period_duration_days,
        }
    }

    /// 获取当前活跃周期；不存在则创建一个新的收集周期
    ///
    /// 幂等：连续调用返回同一个周期。并发创建时只有一方成功，
    /// 输掉竞争的一方改用已存在的活跃周期。
    pub async fn get_or_create_active_period(&self) -> ApplicationResult<VotingPeriod> {
        if let Some(period) = self.periods.find_active().await? {
            return Ok(period);
        }

        let candidate = VotingPeriod::open(self.clock.now(), self.period_duration_days);
        match self.periods.create(&candidate).await {
            Ok(period) => {
                info!(id = %period.id, end = %period.end_date, "已创建新的收集周期");
                Ok(period)
            }
            Err(RepositoryError::Conflict) => {
                // 竞争创建的另一方刚好先落库，改用它的周期
                let existing = self.periods.find_active().await?;
                existing.ok_or_else(|| PeriodError::NoActivePeriod.into())
            }
            Err(other) => Err(other.into()),
        }
    }

    /// 启动投票：COLLECTING -> VOTING
    ///
    /// 对已处于 VOTING 的周期重复调用是幂等无害的；
    /// 对 COMPLETED 周期调用返回迁移错误。
    pub async fn start_voting(&self, period_id: PeriodId) -> ApplicationResult<VotingPeriod> {
        let mut period = self
            .periods
            .find_by_id(period_id)
            .await?
            .ok_or(PeriodError::NotFound(period_id))?;

        if period.status == PeriodStatus::Voting {
            return Ok(period);
        }

        period
            .start_voting()
            .map_err(|_| PeriodError::InvalidTransition {
                from: period.status.to_string(),
                to: PeriodStatus::Voting.to_string(),
            })?;

        let updated = self.periods.update(&period).await?;
        info!(id = %period_id, "投票已启动");
        Ok(updated)
    }

    /// 周期快照，只读聚合，无任何副作用
    pub async fn period_snapshot(&self) -> ApplicationResult<PeriodSnapshot> {
        let period = self.periods.find_active().await?;

        let selected = match &period {
            Some(active) => {
                self.applications
                    .find_applications(&ApplicationFilter::selected_in_period(active.id))
                    .await?
            }
            None => Vec::new(),
        };

        let total_votes = selected.iter().map(|a| a.votes_count.max(0) as u64).sum();
        let stats = self.applications.get_statistics().await?;

        Ok(PeriodSnapshot {
            period,
            selected,
            total_votes,
            approved_count: stats.approved,
            pending_count: stats.pending,
            total_applications: stats.total,
        })
    }

    /// 当前活跃周期，只查不建
    pub async fn active_period(&self) -> ApplicationResult<Option<VotingPeriod>> {
        Ok(self.periods.find_active().await?)
    }

    /// 已结束的周期，最新在前
    pub async fn completed_periods(&self, limit: u32) -> ApplicationResult<Vec<VotingPeriod>> {
        Ok(self.periods.find_completed(limit).await?)
    }
}
