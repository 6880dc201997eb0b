//! 申请Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{query, query_as, FromRow, Row};
use uuid::Uuid;

use domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationRepository, ApplicationStatistics,
    ApplicationStatus, CountryCount, PeriodId, RepositoryError,
};

use crate::db::repositories::map_sqlx_err;
use crate::db::DbPool;

const APPLICATION_COLUMNS: &str =
    "id, description, amount, country, contact, status, votes_count, period_id, created_at";

/// 数据库申请模型
#[derive(Debug, Clone, FromRow)]
pub(crate) struct DbApplication {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    pub country: String,
    pub contact: Option<String>,
    pub status: String,
    pub votes_count: i64,
    pub period_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbApplication> for Application {
    type Error = RepositoryError;

    fn try_from(value: DbApplication) -> Result<Self, Self::Error> {
        let status = ApplicationStatus::parse(&value.status)
            .map_err(|e| RepositoryError::storage(e.to_string()))?;

        Ok(Application {
            id: ApplicationId::from(value.id),
            description: value.description,
            amount: value.amount,
            country: value.country,
            contact: value.contact,
            status,
            votes_count: value.votes_count,
            period_id: value.period_id.map(PeriodId::from),
            created_at: value.created_at,
        })
    }
}

/// 申请Repository实现
pub struct PgApplicationRepository {
    pool: DbPool,
}

impl PgApplicationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 按过滤条件选择排序规则
    ///
    /// SELECTED 的排序与周期结算的胜者判定使用同一稳定顺序。
    fn order_clause(filter: &ApplicationFilter) -> &'static str {
        match filter.status {
            Some(ApplicationStatus::Selected) => {
                "ORDER BY votes_count DESC, created_at ASC, id ASC"
            }
            Some(ApplicationStatus::Pending) => "ORDER BY created_at ASC",
            _ => "ORDER BY created_at DESC",
        }
    }
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn create(&self, application: &Application) -> Result<Application, RepositoryError> {
        let row = query_as::<_, DbApplication>(
            r#"
            INSERT INTO applications (id, description, amount, country, contact, status, votes_count, period_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, description, amount, country, contact, status, votes_count, period_id, created_at
            "#,
        )
        .bind(Uuid::from(application.id))
        .bind(&application.description)
        .bind(application.amount)
        .bind(&application.country)
        .bind(&application.contact)
        .bind(application.status.as_str())
        .bind(application.votes_count)
        .bind(application.period_id.map(Uuid::from))
        .bind(application.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Application::try_from(row)
    }

    async fn find_by_id(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let row = query_as::<_, DbApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        row.map(Application::try_from).transpose()
    }

    async fn find_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        let mut conditions = Vec::new();
        let mut param_count = 1;

        if filter.status.is_some() {
            conditions.push(format!("status = ${}", param_count));
            param_count += 1;
        }
        if filter.period_id.is_some() {
            conditions.push(format!("period_id = ${}", param_count));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications {} {}",
            where_clause,
            Self::order_clause(filter)
        );

        let mut query = query_as::<_, DbApplication>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(period_id) = filter.period_id {
            query = query.bind(Uuid::from(period_id));
        }

        let rows = query.fetch_all(&self.pool).await.map_err(map_sqlx_err)?;
        rows.into_iter().map(Application::try_from).collect()
    }

    async fn update_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
        period_id: Option<PeriodId>,
    ) -> Result<Application, RepositoryError> {
        // 票数仅在 SELECTED/WINNER 状态下有效，迁出时一并归零
        let row = query_as::<_, DbApplication>(
            r#"
            UPDATE applications
            SET status = $2,
                period_id = $3,
                votes_count = CASE WHEN $2 IN ('SELECTED', 'WINNER') THEN votes_count ELSE 0 END
            WHERE id = $1
            RETURNING id, description, amount, country, contact, status, votes_count, period_id, created_at
            "#,
        )
        .bind(Uuid::from(id))
        .bind(status.as_str())
        .bind(period_id.map(Uuid::from))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        match row {
            Some(row) => Application::try_from(row),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn batch_update_status(
        &self,
        ids: &[ApplicationId],
        status: ApplicationStatus,
        period_id: Option<PeriodId>,
    ) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();

        // 单条 UPDATE 语句，整批天然原子
        let result = query(
            r#"
            UPDATE applications
            SET status = $2,
                period_id = $3,
                votes_count = CASE WHEN $2 IN ('SELECTED', 'WINNER') THEN votes_count ELSE 0 END
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .bind(status.as_str())
        .bind(period_id.map(Uuid::from))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(result.rows_affected())
    }

    async fn get_statistics(&self) -> Result<ApplicationStatistics, RepositoryError> {
        let row = query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'PENDING') AS pending,
                COUNT(*) FILTER (WHERE status = 'APPROVED') AS approved,
                COUNT(*) FILTER (WHERE status = 'SELECTED') AS selected,
                COUNT(*) FILTER (WHERE status = 'REJECTED') AS rejected,
                COUNT(*) FILTER (WHERE status = 'WINNER') AS winners
            FROM applications
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(ApplicationStatistics {
            total: row.get::<i64, _>("total") as u64,
            pending: row.get::<i64, _>("pending") as u64,
            approved: row.get::<i64, _>("approved") as u64,
            selected: row.get::<i64, _>("selected") as u64,
            rejected: row.get::<i64, _>("rejected") as u64,
            winners: row.get::<i64, _>("winners") as u64,
        })
    }

    async fn count_by_country(&self, limit: u32) -> Result<Vec<CountryCount>, RepositoryError> {
        let rows = query(
            r#"
            SELECT country, COUNT(*) AS count
            FROM applications
            GROUP BY country
            ORDER BY count DESC, country ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(rows
            .into_iter()
            .map(|row| CountryCount {
                country: row.get("country"),
                count: row.get::<i64, _>("count") as u64,
            })
            .collect())
    }

    async fn count_countries(&self) -> Result<u64, RepositoryError> {
        let count: i64 = query("SELECT COUNT(DISTINCT country) FROM applications")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?
            .get(0);

        Ok(count as u64)
    }

    async fn find_recent(&self, limit: u32) -> Result<Vec<Application>, RepositoryError> {
        let rows = query_as::<_, DbApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.into_iter().map(Application::try_from).collect()
    }
}
