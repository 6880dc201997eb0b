//! 资助申请实体定义
//!
//! 包含申请的核心信息、状态机以及提交时使用的国家闭集。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::voting_period::PeriodId;
use crate::errors::{DomainError, DomainResult};

/// 申请可选国家闭集
pub const SUPPORTED_COUNTRIES: &[&str] = &[
    "Russia",
    "United States",
    "United Kingdom",
    "Germany",
    "France",
    "Spain",
    "Italy",
    "China",
    "Japan",
    "South Korea",
    "India",
    "Brazil",
    "Mexico",
    "Canada",
    "Australia",
    "Ukraine",
    "Poland",
    "Netherlands",
    "Belgium",
    "Switzerland",
    "Austria",
    "Sweden",
    "Norway",
    "Denmark",
    "Finland",
    "Czech Republic",
    "Portugal",
    "Greece",
    "Turkey",
    "Israel",
    "United Arab Emirates",
    "Saudi Arabia",
    "Egypt",
    "South Africa",
    "Argentina",
    "Chile",
    "Colombia",
    "Peru",
    "Venezuela",
    "Indonesia",
    "Thailand",
    "Vietnam",
    "Philippines",
    "Malaysia",
    "Singapore",
    "New Zealand",
    "Ireland",
    "Other",
];

/// 检查国家是否在闭集中
pub fn is_supported_country(country: &str) -> bool {
    SUPPORTED_COUNTRIES.contains(&country)
}

/// 申请唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ApplicationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ApplicationId> for Uuid {
    fn from(value: ApplicationId) -> Self {
        value.0
    }
}

/// 申请状态枚举
///
/// 合法迁移：PENDING -> APPROVED -> SELECTED -> WINNER（终态），
/// PENDING -> REJECTED（终态），SELECTED -> APPROVED（落选回池）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    /// 待审核
    Pending,
    /// 已批准，等待抽选
    Approved,
    /// 已入选当前周期投票
    Selected,
    /// 周期胜出者
    Winner,
    /// 已拒绝
    Rejected,
}

impl ApplicationStatus {
    /// 存储层使用的状态字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Selected => "SELECTED",
            ApplicationStatus::Winner => "WINNER",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    /// 从存储层的状态字符串解析
    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "APPROVED" => Ok(ApplicationStatus::Approved),
            "SELECTED" => Ok(ApplicationStatus::Selected),
            "WINNER" => Ok(ApplicationStatus::Winner),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            other => Err(DomainError::invalid_argument(
                "application_status",
                format!("未知状态: {}", other),
            )),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 资助申请实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    /// 申请唯一ID
    pub id: ApplicationId,
    /// 申请描述
    pub description: String,
    /// 申请金额（美元）
    pub amount: f64,
    /// 申请人所在国家
    pub country: String,
    /// 联系方式（仅管理端可见）
    pub contact: Option<String>,
    /// 申请状态
    pub status: ApplicationStatus,
    /// 累计得票数，仅在 SELECTED/WINNER 状态下非零
    pub votes_count: i64,
    /// 绑定的投票周期，仅在 SELECTED/WINNER 状态下非空
    pub period_id: Option<PeriodId>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Application {
    /// 创建新申请（调用方负责先完成提交校验）
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        country: impl Into<String>,
        contact: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApplicationId(Uuid::new_v4()),
            description: description.into(),
            amount,
            country: country.into(),
            contact: Some(contact.into()),
            status: ApplicationStatus::Pending,
            votes_count: 0,
            period_id: None,
            created_at: now,
        }
    }

    /// 批准申请（对已批准的申请重复调用无害）
    pub fn approve(&mut self) {
        self.status = ApplicationStatus::Approved;
        self.period_id = None;
    }

    /// 拒绝申请
    pub fn reject(&mut self) {
        self.status = ApplicationStatus::Rejected;
        self.period_id = None;
    }

    /// 入选指定周期的投票，仅允许从 APPROVED 进入
    pub fn mark_selected(&mut self, period_id: PeriodId) -> DomainResult<()> {
        if self.status != ApplicationStatus::Approved {
            return Err(DomainError::invalid_transition(
                self.status.to_string(),
                ApplicationStatus::Selected.to_string(),
            ));
        }
        self.status = ApplicationStatus::Selected;
        self.period_id = Some(period_id);
        Ok(())
    }

    /// 加冕为周期胜出者，仅允许从 SELECTED 进入
    pub fn crown_winner(&mut self) -> DomainResult<()> {
        if self.status != ApplicationStatus::Selected {
            return Err(DomainError::invalid_transition(
                self.status.to_string(),
                ApplicationStatus::Winner.to_string(),
            ));
        }
        self.status = ApplicationStatus::Winner;
        Ok(())
    }

    /// 落选回池：SELECTED -> APPROVED，并清除周期绑定
    pub fn return_to_pool(&mut self) {
        self.status = ApplicationStatus::Approved;
        self.period_id = None;
    }

    /// 记一票（内存实现使用；数据库实现用原子自增）
    pub fn record_vote(&mut self) {
        self.votes_count += 1;
    }

    /// 当前是否开放投票
    pub fn is_open_for_voting(&self) -> bool {
        self.status == ApplicationStatus::Selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_application() -> Application {
        Application::new(
            "x".repeat(300),
            5000.0,
            "Ukraine",
            "helper@example.com",
            Utc::now(),
        )
    }

    #[test]
    fn new_application_is_pending_with_zero_votes() {
        let app = sample_application();
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.votes_count, 0);
        assert!(app.period_id.is_none());
    }

    #[test]
    fn approve_is_idempotent() {
        let mut app = sample_application();
        app.approve();
        assert_eq!(app.status, ApplicationStatus::Approved);
        app.approve();
        assert_eq!(app.status, ApplicationStatus::Approved);
    }

    #[test]
    fn selection_requires_approved_status() {
        let mut app = sample_application();
        let period = PeriodId(Uuid::new_v4());

        assert!(app.mark_selected(period).is_err());

        app.approve();
        assert!(app.mark_selected(period).is_ok());
        assert_eq!(app.status, ApplicationStatus::Selected);
        assert_eq!(app.period_id, Some(period));
    }

    #[test]
    fn winner_requires_selected_status() {
        let mut app = sample_application();
        assert!(app.crown_winner().is_err());

        app.approve();
        app.mark_selected(PeriodId(Uuid::new_v4())).unwrap();
        assert!(app.crown_winner().is_ok());
        assert_eq!(app.status, ApplicationStatus::Winner);
    }

    #[test]
    fn return_to_pool_clears_period_binding() {
        let mut app = sample_application();
        app.approve();
        app.mark_selected(PeriodId(Uuid::new_v4())).unwrap();

        app.return_to_pool();
        assert_eq!(app.status, ApplicationStatus::Approved);
        assert!(app.period_id.is_none());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Selected,
            ApplicationStatus::Winner,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(ApplicationStatus::parse("UNKNOWN").is_err());
    }

    #[test]
    fn country_closed_list_contains_fallback_entry() {
        assert!(is_supported_country("Ukraine"));
        assert!(is_supported_country("Other"));
        assert!(!is_supported_country("Atlantis"));
    }
}
