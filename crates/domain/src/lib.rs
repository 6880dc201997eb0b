//! 资助投票系统核心领域模型
//!
//! 包含资助申请、投票周期、投票流水等核心实体，以及相关的业务规则
//! 和数据访问抽象。

pub mod entities;
pub mod errors;
pub mod identity;
pub mod repositories;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use identity::*;
pub use repositories::*;
