use std::sync::Arc;

use application::{ApplicationService, PeriodCloser, PeriodService, SelectionService, VoteService};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub application_service: Arc<ApplicationService>,
    pub selection_service: Arc<SelectionService>,
    pub period_service: Arc<PeriodService>,
    pub period_closer: Arc<PeriodCloser>,
    pub vote_service: Arc<VoteService>,
    /// 管理端 Bearer 令牌
    pub admin_token: Arc<String>,
    /// 未显式指定数量时的默认抽选份数
    pub default_selection_count: u32,
}

/// 状态装配参数
pub struct AppStateConfig {
    pub application_service: Arc<ApplicationService>,
    pub selection_service: Arc<SelectionService>,
    pub period_service: Arc<PeriodService>,
    pub period_closer: Arc<PeriodCloser>,
    pub vote_service: Arc<VoteService>,
    pub admin_token: String,
    pub default_selection_count: u32,
}

impl AppState {
    pub fn new(config: AppStateConfig) -> Self {
        Self {
            application_service: config.application_service,
            selection_service: config.selection_service,
            period_service: config.period_service,
            period_closer: config.period_closer,
            vote_service: config.vote_service,
            admin_token: Arc::new(config.admin_token),
            default_selection_count: config.default_selection_count,
        }
    }
}
