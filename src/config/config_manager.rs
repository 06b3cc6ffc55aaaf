// ==========================================
// Agenda 导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value, scope_id='global')
// ==========================================

use crate::config::error::ConfigError;
use crate::config::import_config_trait::ImportConfigReader;
use crate::config::import_settings::{DEFAULT_IMPORT_CHUNK_SIZE, DEFAULT_VALIDATE_CHUNK_SIZE};
use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::i18n::DEFAULT_LOCALE;
use crate::importer::column_mapper::DEFAULT_MATCH_THRESHOLD;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn.lock()?;
            configure_sqlite_connection(&conn_guard)?;
            init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.conn.lock()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 解析型读取: 格式错误时告警并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Copy,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self.conn.lock()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let config_map = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<BTreeMap<String, String>, _>>()?;

        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, ConfigError> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_locale(&self) -> Result<String, ConfigError> {
        let value = self.get_config_or_default(config_keys::IMPORT_LOCALE, DEFAULT_LOCALE)?;
        match value.trim() {
            "fr" | "en" => Ok(value.trim().to_string()),
            other => {
                warn!(config_key = config_keys::IMPORT_LOCALE, raw_value = other, "不支持的语言，使用法语");
                Ok(DEFAULT_LOCALE.to_string())
            }
        }
    }

    async fn get_match_threshold(&self) -> Result<f64, ConfigError> {
        let value = self.get_parsed_or_default(config_keys::MATCH_THRESHOLD, DEFAULT_MATCH_THRESHOLD)?;
        if (0.0..1.0).contains(&value) {
            Ok(value)
        } else {
            warn!(config_key = config_keys::MATCH_THRESHOLD, value, "阈值超出 [0, 1)，使用默认值");
            Ok(DEFAULT_MATCH_THRESHOLD)
        }
    }

    async fn get_validate_chunk_size(&self) -> Result<usize, ConfigError> {
        let value =
            self.get_parsed_or_default(config_keys::VALIDATE_CHUNK_SIZE, DEFAULT_VALIDATE_CHUNK_SIZE)?;
        Ok(value.max(1))
    }

    async fn get_import_chunk_size(&self) -> Result<usize, ConfigError> {
        let value = self.get_parsed_or_default(config_keys::IMPORT_CHUNK_SIZE, DEFAULT_IMPORT_CHUNK_SIZE)?;
        Ok(value.max(1))
    }

    async fn get_skip_duplicates(&self) -> Result<bool, ConfigError> {
        self.get_parsed_or_default(config_keys::SKIP_DUPLICATES, true)
    }

    async fn get_skip_blank_rows(&self) -> Result<bool, ConfigError> {
        self.get_parsed_or_default(config_keys::SKIP_BLANK_ROWS, false)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 导入
    pub const IMPORT_LOCALE: &str = "import_locale";
    pub const MATCH_THRESHOLD: &str = "import_match_threshold";
    pub const VALIDATE_CHUNK_SIZE: &str = "import_validate_chunk_size";
    pub const IMPORT_CHUNK_SIZE: &str = "import_chunk_size";
    pub const SKIP_DUPLICATES: &str = "import_skip_duplicates";
    pub const SKIP_BLANK_ROWS: &str = "import_skip_blank_rows";
}
