//! 投票台账服务
//!
//! 记录“每访客每周期每天一票”的投票流水，并原子地累计目标
//! 申请的票数。“一天”的边界为 UTC 零点。应用层的预检查只是
//! 快速路径，真正的去重权威是存储层 (visitor_id, period_id,
//! vote_day) 唯一约束——并发竞争下冲突方会在写入时收到
//! Conflict 并被视作已投票。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use domain::{
    next_vote_time, ApplicationId, ApplicationRepository, PeriodId, RepositoryError, VisitorId,
    Vote, VoteRepository,
};

use crate::clock::Clock;
use crate::errors::{ApplicationResult, VoteError};

/// 投票成功结果
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    pub application_id: ApplicationId,
    pub message: String,
    /// 下一次可投票的时间（下一个 UTC 零点）
    pub next_vote_time: DateTime<Utc>,
}

/// 访客投票状态
#[derive(Debug, Clone, Serialize)]
pub struct VotingStatus {
    pub can_vote: bool,
    pub voted_today: bool,
    /// 今天投过的申请（正常情况下至多一个）
    pub today_votes: Vec<ApplicationId>,
    /// 已投票时给出下一次可投时间
    pub next_vote_time: Option<DateTime<Utc>>,
}

/// 投票服务依赖
pub struct VoteServiceDependencies {
    pub vote_repository: Arc<dyn VoteRepository>,
    pub application_repository: Arc<dyn ApplicationRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 投票台账服务
pub struct VoteService {
    votes: Arc<dyn VoteRepository>,
    applications: Arc<dyn ApplicationRepository>,
    clock: Arc<dyn Clock>,
}

impl VoteService {
    pub fn new(deps: VoteServiceDependencies) -> Self {
        Self {
            votes: deps.vote_repository,
            applications: deps.application_repository,
            clock: deps.clock,
        }
    }

    /// 访客今天是否还能投票（快速路径查询）
    pub async fn can_vote_today(
        &self,
        raw_token: &str,
        period_id: PeriodId,
    ) -> ApplicationResult<bool> {
        let visitor = VisitorId::derive(raw_token)?;
        let today = self.clock.now().date_naive();
        let existing = self
            .votes
            .find_vote_on_day(&visitor, period_id, today)
            .await?;
        Ok(existing.is_none())
    }

    /// 投出一票
    ///
    /// 目标申请必须存在、处于 SELECTED 状态且属于给定周期，
    /// 否则返回 IneligibleTarget。投票记录与票数自增在同一
    /// 事务内完成；唯一约束冲突视作今天已投票，不会重复计票。
    pub async fn cast_vote(
        &self,
        raw_token: &str,
        application_id: ApplicationId,
        period_id: PeriodId,
    ) -> ApplicationResult<VoteOutcome> {
        let visitor = VisitorId::derive(raw_token)?;
        let now = self.clock.now();

        // 快速路径：今天已投过直接拒绝，省一次无谓的写入
        if self
            .votes
            .find_vote_on_day(&visitor, period_id, now.date_naive())
            .await?
            .is_some()
        {
            return Err(VoteError::AlreadyVotedToday {
                next_vote_time: next_vote_time(now),
            }
            .into());
        }

        let target = self.applications.find_by_id(application_id).await?;
        let target = match target {
            Some(app) if app.is_open_for_voting() && app.period_id == Some(period_id) => app,
            _ => return Err(VoteError::IneligibleTarget(application_id).into()),
        };

        let vote = Vote::cast(visitor, target.id, period_id, now);
        match self.votes.record_vote(&vote).await {
            Ok(_) => {}
            // 两个并发请求都通过了预检查时，唯一约束裁决胜负
            Err(RepositoryError::Conflict) => {
                return Err(VoteError::AlreadyVotedToday {
                    next_vote_time: next_vote_time(now),
                }
                .into());
            }
            Err(other) => return Err(other.into()),
        }

        info!(application = %application_id, period = %period_id, "投票成功");
        Ok(VoteOutcome {
            application_id,
            message: "投票成功，每天都可以再投一票".to_string(),
            next_vote_time: next_vote_time(now),
        })
    }

    /// 投票总数统计；给定周期时仅统计该周期
    pub async fn total_votes(&self, period_id: Option<PeriodId>) -> ApplicationResult<u64> {
        Ok(self.votes.count_votes(period_id).await?)
    }

    /// 访客投票状态查询，只读
    pub async fn voting_status(
        &self,
        raw_token: &str,
        period_id: PeriodId,
    ) -> ApplicationResult<VotingStatus> {
        let visitor = VisitorId::derive(raw_token)?;
        let now = self.clock.now();

        let today_vote = self
            .votes
            .find_vote_on_day(&visitor, period_id, now.date_naive())
            .await?;

        Ok(match today_vote {
            Some(vote) => VotingStatus {
                can_vote: false,
                voted_today: true,
                today_votes: vec![vote.application_id],
                next_vote_time: Some(next_vote_time(now)),
            },
            None => VotingStatus {
                can_vote: true,
                voted_today: false,
                today_votes: Vec::new(),
                next_vote_time: None,
            },
        })
    }
}
