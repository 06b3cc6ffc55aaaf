// ==========================================
// Agenda 导入 - 行 → 待创建实体
// ==========================================
// 职责:
// - RowRecord → NewClient / NewService / NewAppointment
// - 预约: 按邮箱解析客户, 按名称解析服务
// - 重复检测（客户邮箱 / 服务名称）
// 输出: 每行一个 ValidatedRow（Ok = 待创建, Err = 拒绝原因）
// ==========================================

use crate::domain::import::RowRecord;
use crate::domain::types::{AppointmentStatus, EntityType};
use crate::domain::{
    Client, NewAppointment, NewClient, NewService, Service, DEFAULT_DURATION_MINUTES,
    DEFAULT_SERVICE_COLOR,
};
use crate::importer::importer_trait::ConflictHandler;
use crate::importer::messages::RowMessages;
use crate::importer::row_validator::RowCheck;
use crate::repository::{EntityRepository, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 待创建实体
#[derive(Debug, Clone, PartialEq)]
pub enum EntityDraft {
    Client(NewClient),
    Service(NewService),
    Appointment(NewAppointment),
}

/// 行被拒绝的原因
#[derive(Debug, Clone, PartialEq)]
pub enum RowRejection {
    Blank,
    Duplicate,
    Invalid(Vec<String>),
}

/// 单行最终校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRow {
    pub row_number: usize,
    pub warnings: Vec<String>,
    pub outcome: Result<EntityDraft, RowRejection>,
}

impl ValidatedRow {
    pub fn is_ready(&self) -> bool {
        self.outcome.is_ok()
    }
}

// ==========================================
// 字段 → 实体
// ==========================================

pub fn build_client(record: &RowRecord) -> NewClient {
    NewClient {
        first_name: record.text("first_name").unwrap_or_default(),
        last_name: record.text("last_name").unwrap_or_default(),
        email: record.text("email"),
        phone: record.text("phone"),
        address: record.text("address"),
        city: record.text("city"),
        postal_code: record.text("postal_code"),
        notes: record.text("notes"),
        loyalty_points: record.integer("loyalty_points").unwrap_or(0),
    }
}

pub fn build_service(record: &RowRecord) -> NewService {
    NewService {
        name: record.text("name").unwrap_or_default(),
        description: record.text("description"),
        duration_minutes: record.integer("duration").unwrap_or(DEFAULT_DURATION_MINUTES),
        price: record.number("price").unwrap_or(0.0),
        color: record
            .text("color")
            .unwrap_or_else(|| DEFAULT_SERVICE_COLOR.to_string()),
        category: record.text("category"),
    }
}

fn start_at(record: &RowRecord) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(&record.text("date")?, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(&record.text("start_time")?, "%H:%M").ok()?;
    Some(date.and_time(time))
}

fn lookup_key(value: &str) -> String {
    value.trim().to_lowercase()
}

// ==========================================
// ImportContext - 单次导入的查找表
// ==========================================
// 在导入开始时从仓储加载一次
#[derive(Debug, Default)]
pub struct ImportContext {
    entity: Option<EntityType>,
    clients_by_email: HashMap<String, String>, // email → client id
    services_by_name: HashMap<String, Service>,
    existing_keys: Vec<String>,                // 重复检测基准
    skip_duplicates: bool,
}

impl ImportContext {
    /// 加载查找表
    ///
    /// - 客户: skip_duplicates 时加载已有邮箱
    /// - 服务: skip_duplicates 时加载已有名称
    /// - 预约: 加载全部客户、服务
    pub async fn load(
        repo: &dyn EntityRepository,
        entity: EntityType,
        skip_duplicates: bool,
    ) -> RepositoryResult<Self> {
        let mut context = Self {
            entity: Some(entity),
            skip_duplicates,
            ..Default::default()
        };

        match entity {
            EntityType::Client if skip_duplicates => {
                context.existing_keys = repo
                    .get_clients()
                    .await?
                    .into_iter()
                    .filter_map(|c| c.email)
                    .collect();
            }
            EntityType::Service if skip_duplicates => {
                context.existing_keys = repo.get_services().await?.into_iter().map(|s| s.name).collect();
            }
            EntityType::Appointment => {
                let clients = repo.get_clients().await?;
                let services = repo.get_services().await?;
                context = context.with_lookup(&clients, services);
            }
            _ => {}
        }

        debug!(
            entity = %entity,
            clients = context.clients_by_email.len(),
            services = context.services_by_name.len(),
            existing = context.existing_keys.len(),
            "导入查找表已加载"
        );
        Ok(context)
    }

    fn with_lookup(mut self, clients: &[Client], services: Vec<Service>) -> Self {
        self.clients_by_email = clients
            .iter()
            .filter_map(|c| c.email.as_deref().map(|e| (lookup_key(e), c.id.clone())))
            .collect();
        for service in services {
            // 同名服务保留第一个
            self.services_by_name
                .entry(lookup_key(&service.name))
                .or_insert(service);
        }
        self
    }

    /// 行校验结果 → 最终结果（重复检测 + 实体构建）
    ///
    /// # 参数
    /// - checks: (行号, 校验结果), 按行号升序
    pub fn resolve(
        &self,
        checks: Vec<(usize, RowCheck)>,
        conflict_handler: &dyn ConflictHandler,
        messages: &RowMessages,
    ) -> Vec<ValidatedRow> {
        let duplicates = self.duplicate_rows(&checks, conflict_handler, messages);

        checks
            .into_iter()
            .map(|(row_number, check)| match check {
                RowCheck::Blank => ValidatedRow {
                    row_number,
                    warnings: Vec::new(),
                    outcome: Err(RowRejection::Blank),
                },
                RowCheck::Invalid { errors, warnings } => ValidatedRow {
                    row_number,
                    warnings,
                    outcome: Err(RowRejection::Invalid(errors)),
                },
                RowCheck::Valid { record, mut warnings } => {
                    if let Some(message) = duplicates.get(&row_number) {
                        warnings.push(message.clone());
                        return ValidatedRow {
                            row_number,
                            warnings,
                            outcome: Err(RowRejection::Duplicate),
                        };
                    }
                    let outcome = self.build_draft(&record, &mut warnings, messages);
                    ValidatedRow {
                        row_number,
                        warnings,
                        outcome,
                    }
                }
            })
            .collect()
    }

    /// 行号 → 重复警告
    fn duplicate_rows(
        &self,
        checks: &[(usize, RowCheck)],
        conflict_handler: &dyn ConflictHandler,
        messages: &RowMessages,
    ) -> HashMap<usize, String> {
        if !self.skip_duplicates {
            return HashMap::new();
        }
        let (key, render): (&str, fn(&RowMessages, usize, &str) -> String) = match self.entity {
            Some(EntityType::Client) => ("email", RowMessages::duplicate_client),
            Some(EntityType::Service) => ("name", RowMessages::duplicate_service),
            _ => return HashMap::new(),
        };

        let records: Vec<RowRecord> = checks
            .iter()
            .filter_map(|(_, check)| match check {
                RowCheck::Valid { record, .. } => Some(record.clone()),
                _ => None,
            })
            .collect();

        let mut seen = HashSet::new();
        conflict_handler
            .detect_cross_batch_duplicates(&records, key, &self.existing_keys)
            .into_iter()
            .chain(conflict_handler.detect_duplicates(&records, key))
            .filter(|(row, _)| seen.insert(*row))
            .map(|(row, value)| (row, render(messages, row, &value)))
            .collect()
    }

    fn build_draft(
        &self,
        record: &RowRecord,
        warnings: &mut Vec<String>,
        messages: &RowMessages,
    ) -> Result<EntityDraft, RowRejection> {
        match self.entity {
            Some(EntityType::Client) => Ok(EntityDraft::Client(build_client(record))),
            Some(EntityType::Service) => Ok(EntityDraft::Service(build_service(record))),
            Some(EntityType::Appointment) => self
                .build_appointment(record, warnings, messages)
                .map(EntityDraft::Appointment)
                .map_err(|error| RowRejection::Invalid(vec![error])),
            None => Err(RowRejection::Invalid(Vec::new())),
        }
    }

    /// 预约: 客户必须存在, 服务缺失只告警
    fn build_appointment(
        &self,
        record: &RowRecord,
        warnings: &mut Vec<String>,
        messages: &RowMessages,
    ) -> Result<NewAppointment, String> {
        let row = record.row_number;
        let email = record.text("client_email").unwrap_or_default();
        let client_id = self
            .clients_by_email
            .get(&lookup_key(&email))
            .cloned()
            .ok_or_else(|| messages.client_not_found(row, &email))?;

        let service = match record.text("service_name") {
            Some(name) => {
                let found = self.services_by_name.get(&lookup_key(&name));
                if found.is_none() {
                    warnings.push(messages.service_not_found(row, &name));
                }
                found
            }
            None => None,
        };

        let start_at = start_at(record).ok_or_else(|| messages.invalid_datetime(row))?;
        let duration_minutes = record
            .integer("duration")
            .or_else(|| service.map(|s| s.duration_minutes))
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        let price = record.number("price").or_else(|| service.map(|s| s.price));
        let status = record
            .text("status")
            .and_then(|s| AppointmentStatus::parse_label(&s))
            .unwrap_or_default();

        Ok(NewAppointment {
            client_id,
            service_id: service.map(|s| s.id.clone()),
            start_at,
            duration_minutes,
            status,
            price,
            notes: record.text("notes"),
        })
    }
}
