//! 周期Repository实现
//!
//! 单活跃周期约束由 voting_periods 上的部分唯一索引保证；
//! 周期结算在一个事务内完成胜者加冕、落选回池和周期归档。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow};
use uuid::Uuid;

use domain::{
    Application, ApplicationId, PeriodClosure, PeriodId, PeriodRepository, PeriodStatus,
    RepositoryError, VotingPeriod,
};

use crate::db::repositories::application_repository_impl::DbApplication;
use crate::db::repositories::map_sqlx_err;
use crate::db::DbPool;

const PERIOD_COLUMNS: &str = "id, start_date, end_date, status, winner_id, created_at";

/// 数据库周期模型
#[derive(Debug, Clone, FromRow)]
struct DbPeriod {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub winner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbPeriod> for VotingPeriod {
    type Error = RepositoryError;

    fn try_from(value: DbPeriod) -> Result<Self, Self::Error> {
        let status = PeriodStatus::parse(&value.status)
            .map_err(|e| RepositoryError::storage(e.to_string()))?;

        Ok(VotingPeriod {
            id: PeriodId::from(value.id),
            start_date: value.start_date,
            end_date: value.end_date,
            status,
            winner_id: value.winner_id.map(ApplicationId::from),
            created_at: value.created_at,
        })
    }
}

/// 周期Repository实现
pub struct PgPeriodRepository {
    pool: DbPool,
}

impl PgPeriodRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PeriodRepository for PgPeriodRepository {
    async fn create(&self, period: &VotingPeriod) -> Result<VotingPeriod, RepositoryError> {
        let row = query_as::<_, DbPeriod>(
            r#"
            INSERT INTO voting_periods (id, start_date, end_date, status, winner_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, start_date, end_date, status, winner_id, created_at
            "#,
        )
        .bind(Uuid::from(period.id))
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.status.as_str())
        .bind(period.winner_id.map(Uuid::from))
        .bind(period.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        VotingPeriod::try_from(row)
    }

    async fn find_by_id(&self, id: PeriodId) -> Result<Option<VotingPeriod>, RepositoryError> {
        let row = query_as::<_, DbPeriod>(&format!(
            "SELECT {PERIOD_COLUMNS} FROM voting_periods WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(VotingPeriod::try_from).transpose()
    }

    async fn find_active(&self) -> Result<Option<VotingPeriod>, RepositoryError> {
        let row = query_as::<_, DbPeriod>(&format!(
            r#"
            SELECT {PERIOD_COLUMNS} FROM voting_periods
            WHERE status IN ('COLLECTING', 'VOTING')
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(VotingPeriod::try_from).transpose()
    }

    async fn update(&self, period: &VotingPeriod) -> Result<VotingPeriod, RepositoryError> {
        let row = query_as::<_, DbPeriod>(
            r#"
            UPDATE voting_periods
            SET status = $2, winner_id = $3
            WHERE id = $1
            RETURNING id, start_date, end_date, status, winner_id, created_at
            "#,
        )
        .bind(Uuid::from(period.id))
        .bind(period.status.as_str())
        .bind(period.winner_id.map(Uuid::from))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(row) => VotingPeriod::try_from(row),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn close_period(&self, id: PeriodId) -> Result<PeriodClosure, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // 1. 锁定并选出胜者：票数降序、创建时间升序、ID升序
        let winner_row = query_as::<_, DbApplication>(
            r#"
            SELECT id, description, amount, country, contact, status, votes_count, period_id, created_at
            FROM applications
            WHERE period_id = $1 AND status = 'SELECTED'
            ORDER BY votes_count DESC, created_at ASC, id ASC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        // 2. 胜者加冕
        let winner = match winner_row {
            Some(row) => {
                let crowned = query_as::<_, DbApplication>(
                    r#"
                    UPDATE applications
                    SET status = 'WINNER'
                    WHERE id = $1
                    RETURNING id, description, amount, country, contact, status, votes_count, period_id, created_at
                    "#,
                )
                .bind(row.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
                Some(Application::try_from(crowned)?)
            }
            None => None,
        };

        // 3. 其余入选申请回池：状态、周期绑定、票数一并复位
        query(
            r#"
            UPDATE applications
            SET status = 'APPROVED', period_id = NULL, votes_count = 0
            WHERE period_id = $1 AND status = 'SELECTED'
            "#,
        )
        .bind(Uuid::from(id))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        // 4. 周期归档
        let period_row = query_as::<_, DbPeriod>(
            r#"
            UPDATE voting_periods
            SET status = 'COMPLETED', winner_id = $2
            WHERE id = $1
            RETURNING id, start_date, end_date, status, winner_id, created_at
            "#,
        )
        .bind(Uuid::from(id))
        .bind(winner.as_ref().map(|w| Uuid::from(w.id)))
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let period = match period_row {
            Some(row) => VotingPeriod::try_from(row)?,
            // 周期不存在则整体回滚
            None => return Err(RepositoryError::NotFound),
        };

        tx.commit().await.map_err(map_sqlx_err)?;

        Ok(PeriodClosure { period, winner })
    }

    async fn find_completed(&self, limit: u32) -> Result<Vec<VotingPeriod>, RepositoryError> {
        let rows = query_as::<_, DbPeriod>(&format!(
            r#"
            SELECT {PERIOD_COLUMNS} FROM voting_periods
            WHERE status = 'COMPLETED'
            ORDER BY end_date DESC
            LIMIT $1
            "#
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.into_iter().map(VotingPeriod::try_from).collect()
    }
}
