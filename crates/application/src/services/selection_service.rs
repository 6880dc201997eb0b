//! 随机抽选服务
//!
//! 从已批准的申请中无偏地抽出一部分进入指定周期的投票。
//! 采用 Fisher-Yates 洗牌而不是任何排序打分，避免对早提交的
//! 申请产生系统性偏向；随机源可注入种子以便测试复现。

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use domain::{
    ApplicationFilter, ApplicationId, ApplicationRepository, ApplicationStatus, PeriodId,
};

use crate::errors::ApplicationResult;

/// 抽选结果
#[derive(Debug, Clone, Serialize)]
pub struct SelectionOutcome {
    pub success: bool,
    pub selected: u64,
    pub message: String,
}

/// 抽选服务依赖
pub struct SelectionServiceDependencies {
    pub application_repository: Arc<dyn ApplicationRepository>,
}

/// 随机抽选服务
pub struct SelectionService {
    applications: Arc<dyn ApplicationRepository>,
    rng: Mutex<StdRng>,
}

impl SelectionService {
    pub fn new(deps: SelectionServiceDependencies) -> Self {
        Self {
            applications: deps.application_repository,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// 使用固定种子创建，用于可复现的测试
    pub fn with_seed(deps: SelectionServiceDependencies, seed: u64) -> Self {
        Self {
            applications: deps.application_repository,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 随机抽选至多 count 份已批准申请进入指定周期
    ///
    /// 没有已批准申请时返回 success=false 的结果而不是错误，
    /// 且不产生任何变更。批量状态更新整批生效或整批回滚。
    pub async fn select_random(
        &self,
        count: u32,
        period_id: PeriodId,
    ) -> ApplicationResult<SelectionOutcome> {
        let approved = self
            .applications
            .find_applications(&ApplicationFilter::by_status(ApplicationStatus::Approved))
            .await?;

        if approved.is_empty() {
            return Ok(SelectionOutcome {
                success: false,
                selected: 0,
                message: "没有已批准的申请可供抽选".to_string(),
            });
        }

        let mut candidates: Vec<ApplicationId> = approved.iter().map(|a| a.id).collect();
        {
            let mut rng = self.rng.lock().await;
            candidates.shuffle(&mut *rng);
        }

        let take = (count as usize).min(candidates.len());
        let chosen = &candidates[..take];

        let updated = self
            .applications
            .batch_update_status(chosen, ApplicationStatus::Selected, Some(period_id))
            .await?;

        info!(selected = updated, period = %period_id, "已抽选申请进入投票");
        Ok(SelectionOutcome {
            success: true,
            selected: updated,
            message: format!("已抽选 {} 份申请进入投票", updated),
        })
    }
}
