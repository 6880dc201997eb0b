//! 服务单元测试共用的内存存储实现
//!
//! 在单个进程内模拟存储契约的全部语义：状态过滤查询、批量更新、
//! 原子计票、(visitor, period, day) 唯一约束以及单活跃周期约束。
//! 所有写操作都在一把写锁内完成，天然满足“整批生效或整批回滚”。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tokio::sync::RwLock;

use domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationRepository, ApplicationStatistics,
    ApplicationStatus, CountryCount, PeriodClosure, PeriodId, PeriodRepository, RepositoryError,
    VisitorId, Vote, VoteRepository, VotingPeriod,
};

use crate::clock::Clock;

/// 可手动拨动的测试时钟
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::days(days);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// 内存存储，聚合实现三个 Repository 契约
#[derive(Default)]
pub struct InMemoryStorage {
    applications: RwLock<HashMap<ApplicationId, Application>>,
    periods: RwLock<HashMap<PeriodId, VotingPeriod>>,
    votes: RwLock<Vec<Vote>>,
}

impl InMemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 测试夹具：直接设置某申请的票数
    pub async fn set_votes(&self, id: ApplicationId, votes: i64) {
        let mut applications = self.applications.write().await;
        if let Some(app) = applications.get_mut(&id) {
            app.votes_count = votes;
        }
    }

    /// 测试断言：当前票数
    pub async fn votes_of(&self, id: ApplicationId) -> i64 {
        let applications = self.applications.read().await;
        applications.get(&id).map(|a| a.votes_count).unwrap_or(0)
    }

    /// 测试断言：投票流水总条数
    pub async fn vote_records(&self) -> usize {
        self.votes.read().await.len()
    }

    /// 测试断言：按ID读取申请（避免与两个 Repository 特征的
    /// find_by_id 同名方法产生歧义）
    pub async fn application(&self, id: ApplicationId) -> Option<Application> {
        self.applications.read().await.get(&id).cloned()
    }

    fn apply_status(
        application: &mut Application,
        status: ApplicationStatus,
        period_id: Option<PeriodId>,
    ) {
        application.status = status;
        application.period_id = period_id;
        // 票数仅在 SELECTED/WINNER 状态下有效
        if !matches!(
            status,
            ApplicationStatus::Selected | ApplicationStatus::Winner
        ) {
            application.votes_count = 0;
        }
    }

    fn sort_for_filter(filter: &ApplicationFilter, items: &mut [Application]) {
        match filter.status {
            Some(ApplicationStatus::Selected) => items.sort_by(|a, b| {
                b.votes_count
                    .cmp(&a.votes_count)
                    .then(a.created_at.cmp(&b.created_at))
                    .then(a.id.cmp(&b.id))
            }),
            Some(ApplicationStatus::Pending) => {
                items.sort_by(|a, b| a.created_at.cmp(&b.created_at))
            }
            _ => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryStorage {
    async fn create(&self, application: &Application) -> Result<Application, RepositoryError> {
        let mut applications = self.applications.write().await;
        applications.insert(application.id, application.clone());
        Ok(application.clone())
    }

    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let applications = self.applications.read().await;
        Ok(applications.get(&id).cloned())
    }

    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        let applications = self.applications.read().await;
        let mut items: Vec<Application> = applications
            .values()
            .filter(|a| filter.status.map_or(true, |status| a.status == status))
            .filter(|a| {
                filter
                    .period_id
                    .map_or(true, |period| a.period_id == Some(period))
            })
            .cloned()
            .collect();
        Self::sort_for_filter(filter, &mut items);
        Ok(items)
    }

    async fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
        period_id: Option<PeriodId>,
    ) -> Result<Application, RepositoryError> {
        let mut applications = self.applications.write().await;
        let application = applications.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        Self::apply_status(application, status, period_id);
        Ok(application.clone())
    }

    async fn batch_update_status(
        &self,
        ids: &[ApplicationId],
        status: ApplicationStatus,
        period_id: Option<PeriodId>,
    ) -> Result<u64, RepositoryError> {
        let mut applications = self.applications.write().await;
        let mut updated = 0;
        for id in ids {
            if let Some(application) = applications.get_mut(id) {
                Self::apply_status(application, status, period_id);
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn get_statistics(&self) -> Result<ApplicationStatistics, RepositoryError> {
        let applications = self.applications.read().await;
        let mut stats = ApplicationStatistics {
            total: applications.len() as u64,
            ..Default::default()
        };
        for application in applications.values() {
            match application.status {
                ApplicationStatus::Pending => stats.pending += 1,
                ApplicationStatus::Approved => stats.approved += 1,
                ApplicationStatus::Selected => stats.selected += 1,
                ApplicationStatus::Rejected => stats.rejected += 1,
                ApplicationStatus::Winner => stats.winners += 1,
            }
        }
        Ok(stats)
    }

    async fn count_by_country(&self, limit: u32) -> Result<Vec<CountryCount>, RepositoryError> {
        let applications = self.applications.read().await;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for application in applications.values() {
            *counts.entry(application.country.clone()).or_default() += 1;
        }
        let mut items: Vec<CountryCount> = counts
            .into_iter()
            .map(|(country, count)| CountryCount { country, count })
            .collect();
        items.sort_by(|a, b| b.count.cmp(&a.count).then(a.country.cmp(&b.country)));
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn count_countries(&self) -> Result<u64, RepositoryError> {
        let applications = self.applications.read().await;
        let countries: HashSet<&str> = applications
            .values()
            .map(|a| a.country.as_str())
            .collect();
        Ok(countries.len() as u64)
    }

    async fn find_recent(&self, limit: u32) -> Result<Vec<Application>, RepositoryError> {
        let applications = self.applications.read().await;
        let mut items: Vec<Application> = applications.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit as usize);
        Ok(items)
    }
}

#[async_trait]
impl PeriodRepository for InMemoryStorage {
    async fn create(&self, period: &VotingPeriod) -> Result<VotingPeriod, RepositoryError> {
        let mut periods = self.periods.write().await;
        if periods.values().any(|p| p.is_active()) {
            return Err(RepositoryError::Conflict);
        }
        periods.insert(period.id, period.clone());
        Ok(period.clone())
    }

    async fn find_by_id(&self, id: PeriodId) -> Result<Option<VotingPeriod>, RepositoryError> {
        let periods = self.periods.read().await;
        Ok(periods.get(&id).cloned())
    }

    async fn find_active(&self) -> Result<Option<VotingPeriod>, RepositoryError> {
        let periods = self.periods.read().await;
        Ok(periods
            .values()
            .filter(|p| p.is_active())
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn update(&self, period: &VotingPeriod) -> Result<VotingPeriod, RepositoryError> {
        let mut periods = self.periods.write().await;
        let slot = periods.get_mut(&period.id).ok_or(RepositoryError::NotFound)?;
        *slot = period.clone();
        Ok(period.clone())
    }

    async fn close_period(&self, id: PeriodId) -> Result<PeriodClosure, RepositoryError> {
        let mut periods = self.periods.write().await;
        let mut applications = self.applications.write().await;

        let period = periods.get_mut(&id).ok_or(RepositoryError::NotFound)?;

        let mut selected: Vec<ApplicationId> = applications
            .values()
            .filter(|a| a.status == ApplicationStatus::Selected && a.period_id == Some(id))
            .map(|a| a.id)
            .collect();
        selected.sort_by(|a, b| {
            let left = &applications[a];
            let right = &applications[b];
            right
                .votes_count
                .cmp(&left.votes_count)
                .then(left.created_at.cmp(&right.created_at))
                .then(left.id.cmp(&right.id))
        });

        let winner_id = selected.first().copied();
        for id in &selected {
            let application = applications.get_mut(id).expect("selected application");
            if Some(application.id) == winner_id {
                application.status = ApplicationStatus::Winner;
            } else {
                application.status = ApplicationStatus::Approved;
                application.period_id = None;
                application.votes_count = 0;
            }
        }

        period.status = domain::PeriodStatus::Completed;
        period.winner_id = winner_id;

        Ok(PeriodClosure {
            period: period.clone(),
            winner: winner_id.and_then(|id| applications.get(&id).cloned()),
        })
    }

    async fn find_completed(&self, limit: u32) -> Result<Vec<VotingPeriod>, RepositoryError> {
        let periods = self.periods.read().await;
        let mut items: Vec<VotingPeriod> = periods
            .values()
            .filter(|p| p.status == domain::PeriodStatus::Completed)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.end_date.cmp(&a.end_date));
        items.truncate(limit as usize);
        Ok(items)
    }
}

#[async_trait]
impl VoteRepository for InMemoryStorage {
    async fn find_vote_on_day(
        &self,
        visitor_id: &VisitorId,
        period_id: PeriodId,
        day: NaiveDate,
    ) -> Result<Option<Vote>, RepositoryError> {
        let votes = self.votes.read().await;
        Ok(votes
            .iter()
            .find(|v| v.visitor_id == *visitor_id && v.period_id == period_id && v.vote_day == day)
            .cloned())
    }

    async fn record_vote(&self, vote: &Vote) -> Result<Vote, RepositoryError> {
        let mut votes = self.votes.write().await;
        let mut applications = self.applications.write().await;

        // 唯一约束：同访客、同周期、同一天只允许一条流水
        if votes.iter().any(|v| {
            v.visitor_id == vote.visitor_id
                && v.period_id == vote.period_id
                && v.vote_day == vote.vote_day
        }) {
            return Err(RepositoryError::Conflict);
        }

        let application = applications
            .get_mut(&vote.application_id)
            .ok_or_else(|| RepositoryError::storage("投票目标申请不存在"))?;

        votes.push(vote.clone());
        application.votes_count += 1;
        Ok(vote.clone())
    }

    async fn count_votes(&self, period_id: Option<PeriodId>) -> Result<u64, RepositoryError> {
        let votes = self.votes.read().await;
        Ok(votes
            .iter()
            .filter(|v| period_id.map_or(true, |period| v.period_id == period))
            .count() as u64)
    }
}
