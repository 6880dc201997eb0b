//! 投票流水实体定义
//!
//! 同一访客在同一周期的同一个 UTC 日历日内最多投一票，
//! 去重键为 (visitor_id, period_id, vote_day)。

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::application::ApplicationId;
use crate::entities::voting_period::PeriodId;
use crate::identity::VisitorId;

/// 投票记录唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteId(pub Uuid);

impl VoteId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for VoteId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<VoteId> for Uuid {
    fn from(value: VoteId) -> Self {
        value.0
    }
}

/// 投票流水实体
///
/// 创建后不再更新或删除。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// 流水唯一ID
    pub id: VoteId,
    /// 投票访客标识
    pub visitor_id: VisitorId,
    /// 投给的申请
    pub application_id: ApplicationId,
    /// 所属周期
    pub period_id: PeriodId,
    /// 投票时刻所在的 UTC 日历日，去重约束以此为准
    pub vote_day: NaiveDate,
    /// 投票时间
    pub created_at: DateTime<Utc>,
}

impl Vote {
    /// 以给定时刻铸造一条投票流水
    pub fn cast(
        visitor_id: VisitorId,
        application_id: ApplicationId,
        period_id: PeriodId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: VoteId(Uuid::new_v4()),
            visitor_id,
            application_id,
            period_id,
            vote_day: now.date_naive(),
            created_at: now,
        }
    }
}

/// 下一次可投票时间：当前时刻之后的下一个 UTC 零点
pub fn next_vote_time(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive() + Duration::days(1);
    Utc.from_utc_datetime(&tomorrow.and_time(NaiveTime::MIN))
}
