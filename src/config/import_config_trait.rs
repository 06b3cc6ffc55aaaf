// ==========================================
// Agenda 导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigError;
use crate::config::import_settings::ImportSettings;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 行级消息语言
    ///
    /// # 默认值
    /// - "fr"
    async fn get_locale(&self) -> Result<String, ConfigError>;

    /// 列自动识别阈值（得分严格大于才接受）
    ///
    /// # 默认值
    /// - 0.3
    async fn get_match_threshold(&self) -> Result<f64, ConfigError>;

    /// 批量校验分块大小
    ///
    /// # 默认值
    /// - 100
    async fn get_validate_chunk_size(&self) -> Result<usize, ConfigError>;

    /// 批量写入分块大小
    ///
    /// # 默认值
    /// - 50
    async fn get_import_chunk_size(&self) -> Result<usize, ConfigError>;

    /// 是否跳过重复行（客户邮箱 / 服务名称）
    ///
    /// # 默认值
    /// - true
    async fn get_skip_duplicates(&self) -> Result<bool, ConfigError>;

    /// 是否跳过整行空白的数据行
    ///
    /// # 默认值
    /// - false（空白行按必填列报错）
    async fn get_skip_blank_rows(&self) -> Result<bool, ConfigError>;

    /// 汇总为 ImportSettings
    async fn load_import_settings(&self) -> Result<ImportSettings, ConfigError> {
        Ok(ImportSettings {
            locale: self.get_locale().await?,
            match_threshold: self.get_match_threshold().await?,
            validate_chunk_size: self.get_validate_chunk_size().await?,
            import_chunk_size: self.get_import_chunk_size().await?,
            skip_duplicates: self.get_skip_duplicates().await?,
            skip_blank_rows: self.get_skip_blank_rows().await?,
        })
    }
}
