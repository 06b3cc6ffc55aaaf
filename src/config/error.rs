// ==========================================
// Agenda 导入 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Erreur de base de données : {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Verrou de configuration indisponible : {0}")]
    Lock(String),

    #[error("Valeur invalide pour {key} : {value}")]
    InvalidValue { key: String, value: String },

    #[error("Instantané de configuration invalide : {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl<T> From<std::sync::PoisonError<T>> for ConfigError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        ConfigError::Lock(err.to_string())
    }
}
