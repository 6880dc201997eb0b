//! 周期结算服务
//!
//! 独占 SELECTED -> WINNER / SELECTED -> APPROVED 的收尾迁移：
//! 评出胜者、归档周期、把落选申请放回待抽选池。
//! 结算在存储层作为单个事务执行，不会出现半结算状态。

use std::sync::Arc;

use tracing::info;

use domain::{PeriodClosure, PeriodId, PeriodRepository, PeriodStatus, RepositoryError, VotingPeriod};

use crate::clock::Clock;
use crate::errors::{ApplicationResult, PeriodError};

/// 结算服务依赖
pub struct PeriodCloserDependencies {
    pub period_repository: Arc<dyn PeriodRepository>,
    pub clock: Arc<dyn Clock>,
    /// 新周期的默认持续天数
    pub period_duration_days: i64,
}

/// 周期结算服务
pub struct PeriodCloser {
    periods: Arc<dyn PeriodRepository>,
    clock: Arc<dyn Clock>,
    period_duration_days: i64,
}

impl PeriodCloser {
    pub fn new(deps: PeriodCloserDependencies) -> Self {
        Self {
            periods: deps.period_repository,
            clock: deps.clock,
            period_duration_days: deps.period_duration_days,
        }
    }

    /// 结束一个投票中的周期
    ///
    /// 胜者为该周期 SELECTED 申请中票数最高者，并列时按创建时间
    /// 较早者、再按 ID 较小者胜出（固定的确定性顺序）。没有任何
    /// 入选申请时周期照常结束，只是没有胜者。
    /// 仅允许从 VOTING 结算；对 COLLECTING 或 COMPLETED 周期
    /// 调用返回迁移错误。
    pub async fn end_period(&self, period_id: PeriodId) -> ApplicationResult<PeriodClosure> {
        let period = self
            .periods
            .find_by_id(period_id)
            .await?
            .ok_or(PeriodError::NotFound(period_id))?;

        if period.status != PeriodStatus::Voting {
            return Err(PeriodError::InvalidTransition {
                from: period.status.to_string(),
                to: PeriodStatus::Completed.to_string(),
            }
            .into());
        }

        let closure = self.periods.close_period(period_id).await?;

        match &closure.winner {
            Some(winner) => {
                info!(period = %period_id, winner = %winner.id, votes = winner.votes_count, "周期已结算，产生胜者");
            }
            None => {
                info!(period = %period_id, "周期已结算，本期没有胜者");
            }
        }
        Ok(closure)
    }

    /// 创建新的收集周期
    ///
    /// 已存在活跃周期时失败；该约束由存储层唯一索引保证，
    /// 并发创建时最多一方成功。
    pub async fn create_new_period(
        &self,
        duration_days: Option<i64>,
    ) -> ApplicationResult<VotingPeriod> {
        let days = duration_days.unwrap_or(self.period_duration_days);
        let candidate = VotingPeriod::open(self.clock.now(), days);

        match self.periods.create(&candidate).await {
            Ok(period) => {
                info!(id = %period.id, days, "已创建新周期");
                Ok(period)
            }
            Err(RepositoryError::Conflict) => Err(PeriodError::ActivePeriodExists.into()),
            Err(other) => Err(other.into()),
        }
    }
}
