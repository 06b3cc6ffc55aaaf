// ==========================================
// Agenda 导入 - 实体 Repository 实现
// ==========================================
// 职责: 实现客户 / 服务 / 预约的数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::{
    Appointment, AppointmentStatus, Client, NewAppointment, NewClient, NewService, Service,
};
use crate::repository::entity_repo::EntityRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

fn parse_status(raw: &str) -> AppointmentStatus {
    AppointmentStatus::parse_label(raw).unwrap_or_default()
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        city: row.get(6)?,
        postal_code: row.get(7)?,
        notes: row.get(8)?,
        loyalty_points: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        duration_minutes: row.get(3)?,
        price: row.get(4)?,
        color: row.get(5)?,
        category: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    let status: String = row.get(6)?;
    Ok(Appointment {
        id: row.get(0)?,
        client_id: row.get(1)?,
        service_id: row.get(2)?,
        start_at: row.get(3)?,
        end_at: row.get(4)?,
        duration_minutes: row.get(5)?,
        status: parse_status(&status),
        price: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

// ==========================================
// SqliteEntityRepository
// ==========================================
pub struct SqliteEntityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEntityRepository {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn.lock()?;
            configure_sqlite_connection(&guard)?;
            init_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 内存数据库（试运行 / 测试）
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = crate::db::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}

#[async_trait]
impl EntityRepository for SqliteEntityRepository {
    async fn create_client(&self, client: NewClient) -> RepositoryResult<Client> {
        let created = Client {
            id: Uuid::new_v4().to_string(),
            first_name: client.first_name,
            last_name: client.last_name,
            email: client.email,
            phone: client.phone,
            address: client.address,
            city: client.city,
            postal_code: client.postal_code,
            notes: client.notes,
            loyalty_points: client.loyalty_points,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock()?;
        conn.execute(
            r#"
            INSERT INTO clients (
                id, first_name, last_name, email, phone, address,
                city, postal_code, notes, loyalty_points, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                created.id,
                created.first_name,
                created.last_name,
                created.email,
                created.phone,
                created.address,
                created.city,
                created.postal_code,
                created.notes,
                created.loyalty_points,
                created.created_at,
            ],
        )?;

        Ok(created)
    }

    async fn create_service(&self, service: NewService) -> RepositoryResult<Service> {
        let created = Service {
            id: Uuid::new_v4().to_string(),
            name: service.name,
            description: service.description,
            duration_minutes: service.duration_minutes,
            price: service.price,
            color: service.color,
            category: service.category,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock()?;
        conn.execute(
            r#"
            INSERT INTO services (
                id, name, description, duration_minutes, price, color, category, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                created.id,
                created.name,
                created.description,
                created.duration_minutes,
                created.price,
                created.color,
                created.category,
                created.created_at,
            ],
        )?;

        Ok(created)
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> RepositoryResult<Appointment> {
        let end_at = appointment.end_at();
        let created = Appointment {
            id: Uuid::new_v4().to_string(),
            client_id: appointment.client_id,
            service_id: appointment.service_id,
            start_at: appointment.start_at,
            end_at,
            duration_minutes: appointment.duration_minutes,
            status: appointment.status,
            price: appointment.price,
            notes: appointment.notes,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock()?;
        conn.execute(
            r#"
            INSERT INTO appointments (
                id, client_id, service_id, start_at, end_at, duration_minutes,
                status, price, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                created.id,
                created.client_id,
                created.service_id,
                created.start_at,
                created.end_at,
                created.duration_minutes,
                created.status.to_string(),
                created.price,
                created.notes,
                created.created_at,
            ],
        )?;

        Ok(created)
    }

    async fn get_clients(&self) -> RepositoryResult<Vec<Client>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, first_name, last_name, email, phone, address,
                   city, postal_code, notes, loyalty_points, created_at
            FROM clients
            ORDER BY last_name, first_name
            "#,
        )?;

        let clients = stmt
            .query_map([], client_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clients)
    }

    async fn get_services(&self) -> RepositoryResult<Vec<Service>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, description, duration_minutes, price, color, category, created_at
            FROM services
            ORDER BY name
            "#,
        )?;

        let services = stmt
            .query_map([], service_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(services)
    }

    async fn get_appointments(&self) -> RepositoryResult<Vec<Appointment>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, client_id, service_id, start_at, end_at, duration_minutes,
                   status, price, notes, created_at
            FROM appointments
            ORDER BY start_at
            "#,
        )?;

        let appointments = stmt
            .query_map([], appointment_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(appointments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_client() -> NewClient {
        NewClient {
            first_name: "Marie".to_string(),
            last_name: "Tremblay".to_string(),
            email: Some("marie@test.com".to_string()),
            loyalty_points: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_list_clients() {
        let repo = SqliteEntityRepository::in_memory().unwrap();

        let created = repo.create_client(sample_client()).await.unwrap();
        assert_eq!(created.id.len(), 36);

        let clients = repo.get_clients().await.unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].email.as_deref(), Some("marie@test.com"));
        assert_eq!(clients[0].loyalty_points, 10);
    }

    #[tokio::test]
    async fn test_create_appointment_persists_end_time() {
        let repo = SqliteEntityRepository::in_memory().unwrap();
        let client = repo.create_client(sample_client()).await.unwrap();
        let service = repo
            .create_service(NewService {
                name: "Coupe".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let start = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        repo.create_appointment(NewAppointment {
            client_id: client.id.clone(),
            service_id: Some(service.id.clone()),
            start_at: start,
            duration_minutes: 45,
            status: AppointmentStatus::Confirmed,
            price: Some(40.0),
            notes: None,
        })
        .await
        .unwrap();

        let stored = repo.get_appointments().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].end_at, start + chrono::Duration::minutes(45));
        assert_eq!(stored[0].status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_appointment_with_unknown_client_is_rejected() {
        let repo = SqliteEntityRepository::in_memory().unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let result = repo
            .create_appointment(NewAppointment {
                client_id: "inconnu".to_string(),
                service_id: None,
                start_at: start,
                duration_minutes: 60,
                status: AppointmentStatus::Scheduled,
                price: None,
                notes: None,
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
    }
}
