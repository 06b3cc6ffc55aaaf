// ==========================================
// Agenda 导入 - 实体 Repository Trait
// ==========================================
// 职责: 定义客户 / 服务 / 预约的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{Appointment, Client, NewAppointment, NewClient, NewService, Service};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// EntityRepository Trait
// ==========================================
// 用途: 导入流程的持久化出口
// 实现者: SqliteEntityRepository（使用 rusqlite）
#[async_trait]
pub trait EntityRepository: Send + Sync {
    // ===== 写入 =====

    /// 创建客户（id 与 created_at 由仓储生成）
    async fn create_client(&self, client: NewClient) -> RepositoryResult<Client>;

    /// 创建服务
    async fn create_service(&self, service: NewService) -> RepositoryResult<Service>;

    /// 创建预约
    ///
    /// # 错误
    /// - ForeignKeyViolation: client_id / service_id 不存在
    async fn create_appointment(&self, appointment: NewAppointment) -> RepositoryResult<Appointment>;

    // ===== 查询 =====

    /// 全部客户（预约导入时按邮箱匹配）
    async fn get_clients(&self) -> RepositoryResult<Vec<Client>>;

    /// 全部服务（预约导入时按名称匹配）
    async fn get_services(&self) -> RepositoryResult<Vec<Service>>;

    /// 全部预约
    async fn get_appointments(&self) -> RepositoryResult<Vec<Appointment>>;
}
