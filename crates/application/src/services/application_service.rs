//! 申请生命周期服务
//!
//! 负责申请的提交校验与审核动作（批准/拒绝）。
//! 提交校验一次性收集全部违反的规则，方便申请人一轮改完。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use domain::{
    is_supported_country, Application, ApplicationFilter, ApplicationId, ApplicationRepository,
    ApplicationStatus, RepositoryError,
};

use crate::clock::Clock;
use crate::errors::{ApplicationError, ApplicationResult, SubmissionError};

/// 申请提交请求
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitApplicationRequest {
    /// 申请描述
    #[validate(length(
        min = 200,
        max = 1000,
        message = "描述长度须在 200 到 1000 个字符之间"
    ))]
    pub description: String,
    /// 申请金额（美元）
    #[validate(range(
        exclusive_min = 0.0,
        max = 100000.0,
        message = "申请金额须为不超过 100,000 美元的正数"
    ))]
    pub amount: f64,
    /// 申请人所在国家
    pub country: String,
    /// 联系方式（邮箱或即时通讯账号）
    #[validate(length(min = 5, message = "请填写有效的联系方式（邮箱或即时通讯账号）"))]
    pub contact: String,
    /// 是否同意项目规则
    #[serde(default)]
    pub agreed_to_rules: bool,
}

/// 申请服务依赖
pub struct ApplicationServiceDependencies {
    pub application_repository: Arc<dyn ApplicationRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 申请生命周期服务
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    clock: Arc<dyn Clock>,
}

impl ApplicationService {
    pub fn new(deps: ApplicationServiceDependencies) -> Self {
        Self {
            applications: deps.application_repository,
            clock: deps.clock,
        }
    }

    /// 提交新申请
    ///
    /// 任何一条规则不满足都会失败，并返回全部违反的规则；
    /// 校验失败时不产生任何持久化记录。
    pub async fn submit(
        &self,
        request: SubmitApplicationRequest,
    ) -> ApplicationResult<Application> {
        let errors = Self::collect_violations(&request);
        if !errors.is_empty() {
            warn!(violations = errors.len(), "申请提交校验未通过");
            return Err(SubmissionError::Invalid { errors }.into());
        }

        let application = Application::new(
            request.description,
            request.amount,
            request.country,
            request.contact,
            self.clock.now(),
        );
        let stored = self.applications.create(&application).await?;

        info!(id = %stored.id, country = %stored.country, "新申请已受理，等待审核");
        Ok(stored)
    }

    /// 批准申请；id 未知时返回 NotFound
    pub async fn approve(&self, id: ApplicationId) -> ApplicationResult<Application> {
        let updated = self
            .applications
            .update_status(id, ApplicationStatus::Approved, None)
            .await
            .map_err(|e| Self::map_not_found(e, id))?;

        info!(id = %id, "申请已批准");
        Ok(updated)
    }

    /// 拒绝申请；id 未知时返回 NotFound
    pub async fn reject(&self, id: ApplicationId) -> ApplicationResult<Application> {
        let updated = self
            .applications
            .update_status(id, ApplicationStatus::Rejected, None)
            .await
            .map_err(|e| Self::map_not_found(e, id))?;

        info!(id = %id, "申请已拒绝");
        Ok(updated)
    }

    /// 审核队列：待审核申请，按提交时间先进先出
    pub async fn pending_applications(&self) -> ApplicationResult<Vec<Application>> {
        let pending = self
            .applications
            .find_applications(&ApplicationFilter::by_status(ApplicationStatus::Pending))
            .await?;
        Ok(pending)
    }

    /// 管理端列表：全部申请，最新在前
    pub async fn all_applications(&self) -> ApplicationResult<Vec<Application>> {
        let all = self
            .applications
            .find_applications(&ApplicationFilter::default())
            .await?;
        Ok(all)
    }

    /// 按ID读取单份申请
    pub async fn find_application(
        &self,
        id: ApplicationId,
    ) -> ApplicationResult<Option<Application>> {
        Ok(self.applications.find_by_id(id).await?)
    }

    /// 各状态数量统计
    pub async fn statistics(&self) -> ApplicationResult<domain::ApplicationStatistics> {
        Ok(self.applications.get_statistics().await?)
    }

    /// 按国家聚合的数量，取前 limit 个
    pub async fn country_breakdown(
        &self,
        limit: u32,
    ) -> ApplicationResult<Vec<domain::CountryCount>> {
        Ok(self.applications.count_by_country(limit).await?)
    }

    /// 不同国家总数
    pub async fn distinct_countries(&self) -> ApplicationResult<u64> {
        Ok(self.applications.count_countries().await?)
    }

    /// 最近提交的申请
    pub async fn recent_applications(&self, limit: u32) -> ApplicationResult<Vec<Application>> {
        Ok(self.applications.find_recent(limit).await?)
    }

    /// 收集提交请求违反的全部规则
    ///
    /// 字段级规则走 validator 派生校验，国家闭集与规则同意
    /// 这两条走手工检查，最终合并成一份完整清单。
    fn collect_violations(request: &SubmitApplicationRequest) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(report) = request.validate() {
            let field_errors = report.field_errors();
            // 固定字段顺序，保证错误清单稳定可测
            for field in ["description", "amount", "contact"] {
                if let Some(violations) = field_errors.get(field) {
                    for violation in violations.iter() {
                        if let Some(message) = &violation.message {
                            errors.push(message.to_string());
                        }
                    }
                }
            }
        }

        if !is_supported_country(&request.country) {
            errors.push("请从列表中选择国家".to_string());
        }

        if !request.agreed_to_rules {
            errors.push("必须同意项目规则".to_string());
        }

        errors
    }

    fn map_not_found(error: RepositoryError, id: ApplicationId) -> ApplicationError {
        match error {
            RepositoryError::NotFound => ApplicationError::NotFound(format!("申请不存在: {}", id)),
            other => other.into(),
        }
    }
}
