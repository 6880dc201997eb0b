//! 投票Repository接口定义

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::entities::vote::Vote;
use crate::entities::voting_period::PeriodId;
use crate::errors::RepositoryError;
use crate::identity::VisitorId;

/// 投票Repository接口
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// 查找访客在指定周期、指定 UTC 日历日内的投票记录
    async fn find_vote_on_day(
        &self,
        visitor_id: &VisitorId,
        period_id: PeriodId,
        day: NaiveDate,
    ) -> Result<Option<Vote>, RepositoryError>;

    /// 记录投票并为目标申请原子加一票，两者在同一事务内完成
    ///
    /// (visitor_id, period_id, vote_day) 唯一约束冲突时返回 Conflict，
    /// 此时不得产生任何计票副作用；该冲突是投票去重的权威信号，
    /// 应用层的预检查只是快速路径。
    async fn record_vote(&self, vote: &Vote) -> Result<Vote, RepositoryError>;

    /// 统计投票总数；给定周期时仅统计该周期
    async fn count_votes(&self, period_id: Option<PeriodId>) -> Result<u64, RepositoryError>;
}
