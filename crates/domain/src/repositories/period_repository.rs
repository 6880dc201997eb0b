//! 周期Repository接口定义

use async_trait::async_trait;

use crate::entities::application::Application;
use crate::entities::voting_period::{PeriodId, VotingPeriod};
use crate::errors::RepositoryError;

/// 周期结算结果
#[derive(Debug, Clone)]
pub struct PeriodClosure {
    /// 结算后的周期（status=COMPLETED）
    pub period: VotingPeriod,
    /// 胜出申请；周期内没有入选申请时为空
    pub winner: Option<Application>,
}

/// 周期Repository接口
#[async_trait]
pub trait PeriodRepository: Send + Sync {
    /// 创建新周期
    ///
    /// 存储层以部分唯一索引保证全局最多一个活跃周期，
    /// 已存在活跃周期时返回 Conflict。
    async fn create(&self, period: &VotingPeriod) -> Result<VotingPeriod, RepositoryError>;

    /// 根据ID查找周期
    async fn find_by_id(&self, id: PeriodId) -> Result<Option<VotingPeriod>, RepositoryError>;

    /// 查找当前活跃周期（COLLECTING/VOTING），取最近创建的一个
    async fn find_active(&self) -> Result<Option<VotingPeriod>, RepositoryError>;

    /// 持久化周期状态变更
    async fn update(&self, period: &VotingPeriod) -> Result<VotingPeriod, RepositoryError>;

    /// 结算周期，整体在一个事务内完成：
    /// 在该周期的 SELECTED 申请中按票数降序、创建时间升序、ID 升序
    /// 取第一名为胜出者置为 WINNER；其余 SELECTED 申请回到 APPROVED
    /// 并清除周期绑定；周期置为 COMPLETED 并记录胜出者。
    /// 任何一步失败整体回滚，不得出现半结算状态。
    async fn close_period(&self, id: PeriodId) -> Result<PeriodClosure, RepositoryError>;

    /// 已结束的周期，按结束时间降序取前 limit 个
    async fn find_completed(&self, limit: u32) -> Result<Vec<VotingPeriod>, RepositoryError>;
}
