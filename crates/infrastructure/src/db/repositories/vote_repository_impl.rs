//! 投票Repository实现
//!
//! 投票流水插入与票数自增在同一事务内完成；
//! (visitor_id, period_id, vote_day) 唯一约束冲突映射为
//! Conflict，它是投票去重的权威信号。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{query, query_as, FromRow, Row};
use uuid::Uuid;

use domain::{
    ApplicationId, PeriodId, RepositoryError, VisitorId, Vote, VoteId, VoteRepository,
};

use crate::db::repositories::map_sqlx_err;
use crate::db::DbPool;

/// 数据库投票模型
#[derive(Debug, Clone, FromRow)]
struct DbVote {
    pub id: Uuid,
    pub visitor_id: String,
    pub application_id: Uuid,
    pub period_id: Uuid,
    pub vote_day: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<DbVote> for Vote {
    fn from(value: DbVote) -> Self {
        Vote {
            id: VoteId::from(value.id),
            visitor_id: VisitorId::from_stored(value.visitor_id),
            application_id: ApplicationId::from(value.application_id),
            period_id: PeriodId::from(value.period_id),
            vote_day: value.vote_day,
            created_at: value.created_at,
        }
    }
}

/// 投票Repository实现
pub struct PgVoteRepository {
    pool: DbPool,
}

impl PgVoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteRepository for PgVoteRepository {
    async fn find_vote_on_day(
        &self,
        visitor_id: &VisitorId,
        period_id: PeriodId,
        day: NaiveDate,
    ) -> Result<Option<Vote>, RepositoryError> {
        let row = query_as::<_, DbVote>(
            r#"
            SELECT id, visitor_id, application_id, period_id, vote_day, created_at
            FROM application_votes
            WHERE visitor_id = $1 AND period_id = $2 AND vote_day = $3
            "#,
        )
        .bind(visitor_id.as_str())
        .bind(Uuid::from(period_id))
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(Vote::from))
    }

    async fn record_vote(&self, vote: &Vote) -> Result<Vote, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // 1. 写入流水；同访客同周期同一天的第二条会撞唯一约束
        let row = query_as::<_, DbVote>(
            r#"
            INSERT INTO application_votes (id, visitor_id, application_id, period_id, vote_day, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, visitor_id, application_id, period_id, vote_day, created_at
            "#,
        )
        .bind(Uuid::from(vote.id))
        .bind(vote.visitor_id.as_str())
        .bind(Uuid::from(vote.application_id))
        .bind(Uuid::from(vote.period_id))
        .bind(vote.vote_day)
        .bind(vote.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        // 2. 目标申请票数原子加一；目标必须仍处于 SELECTED
        let updated = query(
            r#"
            UPDATE applications
            SET votes_count = votes_count + 1
            WHERE id = $1 AND status = 'SELECTED'
            "#,
        )
        .bind(Uuid::from(vote.application_id))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        if updated.rows_affected() != 1 {
            // 目标在预检查后被移出选票，整体回滚
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(Vote::from(row))
    }

    async fn count_votes(&self, period_id: Option<PeriodId>) -> Result<u64, RepositoryError> {
        let count: i64 = match period_id {
            Some(period_id) => {
                query("SELECT COUNT(*) FROM application_votes WHERE period_id = $1")
                    .bind(Uuid::from(period_id))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_err)?
                    .get(0)
            }
            None => query("SELECT COUNT(*) FROM application_votes")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?
                .get(0),
        };

        Ok(count as u64)
    }
}
