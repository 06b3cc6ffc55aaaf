// ==========================================
// Agenda 导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod entity_repo;
pub mod entity_repo_impl;
pub mod error;

// 重导出核心仓储
pub use entity_repo::EntityRepository;
pub use entity_repo_impl::SqliteEntityRepository;
pub use error::{RepositoryError, RepositoryResult};
