//! 申请Repository接口定义

use async_trait::async_trait;

use crate::entities::application::{Application, ApplicationId, ApplicationStatus};
use crate::entities::voting_period::PeriodId;
use crate::errors::RepositoryError;

/// 申请查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub period_id: Option<PeriodId>,
}

impl ApplicationFilter {
    /// 按状态过滤
    pub fn by_status(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            period_id: None,
        }
    }

    /// 指定周期内的入选申请
    pub fn selected_in_period(period_id: PeriodId) -> Self {
        Self {
            status: Some(ApplicationStatus::Selected),
            period_id: Some(period_id),
        }
    }
}

/// 各状态申请数量统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationStatistics {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub selected: u64,
    pub rejected: u64,
    pub winners: u64,
}

/// 按国家聚合的申请数量
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

/// 申请Repository接口
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// 持久化新申请
    async fn create(&self, application: &Application) -> Result<Application, RepositoryError>;

    /// 根据ID查找申请
    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;

    /// 条件查询申请
    ///
    /// 排序约定：过滤 SELECTED 时按票数降序（其次按创建时间、ID 升序，
    /// 与胜出者判定使用同一稳定顺序）；过滤 PENDING 时按创建时间升序
    /// （审核队列先进先出）；其余情况按创建时间降序。
    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError>;

    /// 更新申请状态与周期绑定；id 未知时返回 NotFound
    async fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
        period_id: Option<PeriodId>,
    ) -> Result<Application, RepositoryError>;

    /// 批量更新状态与周期绑定，整批要么全部生效要么全部回滚
    async fn batch_update_status(
        &self,
        ids: &[ApplicationId],
        status: ApplicationStatus,
        period_id: Option<PeriodId>,
    ) -> Result<u64, RepositoryError>;

    /// 获取各状态数量统计
    async fn get_statistics(&self) -> Result<ApplicationStatistics, RepositoryError>;

    /// 按国家聚合数量，按数量降序取前 limit 个
    async fn count_by_country(&self, limit: u32) -> Result<Vec<CountryCount>, RepositoryError>;

    /// 不同国家总数
    async fn count_countries(&self) -> Result<u64, RepositoryError>;

    /// 最近提交的申请，按创建时间降序
    async fn find_recent(&self, limit: u32) -> Result<Vec<Application>, RepositoryError>;
}
