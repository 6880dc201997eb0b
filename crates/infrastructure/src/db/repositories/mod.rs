//! PostgreSQL Repository 实现

use domain::RepositoryError;

mod application_repository_impl;
mod period_repository_impl;
mod vote_repository_impl;

pub use application_repository_impl::PgApplicationRepository;
pub use period_repository_impl::PgPeriodRepository;
pub use vote_repository_impl::PgVoteRepository;

/// 把 sqlx 错误归约为存储层错误
///
/// 唯一约束冲突必须映射为 Conflict：投票去重与单活跃周期
/// 都以该信号为权威判据。
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        other => RepositoryError::storage(other.to_string()),
    }
}
