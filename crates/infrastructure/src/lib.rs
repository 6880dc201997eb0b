//! 基础设施层：PostgreSQL 存储实现
//!
//! 实现领域层定义的 Repository 契约。多行写入（批量抽选、
//! 投票计票、周期结算）使用显式事务；投票去重与单活跃周期
//! 两个约束落在数据库唯一索引上。

pub mod db;

pub use db::repositories::{PgApplicationRepository, PgPeriodRepository, PgVoteRepository};
pub use db::{create_pg_pool, DbPool, MIGRATOR};
