//! Repository接口定义
//!
//! 定义数据访问层的抽象接口，遵循清洁架构原则，内层定义接口，外层实现接口。
//! 具体实现见 infrastructure crate（PostgreSQL）以及应用层测试中的内存实现。

pub mod application_repository;
pub mod period_repository;
pub mod vote_repository;

pub use application_repository::{
    ApplicationFilter, ApplicationRepository, ApplicationStatistics, CountryCount,
};
pub use period_repository::{PeriodClosure, PeriodRepository};
pub use vote_repository::VoteRepository;
