// ==========================================
// Agenda 导入 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 错误文本会进入行级错误列表, 使用法语
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("Enregistrement introuvable : {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("Connexion à la base impossible : {0}")]
    DatabaseConnectionError(String),

    #[error("Verrou de la base indisponible : {0}")]
    LockError(String),

    #[error("Échec de la requête : {0}")]
    DatabaseQueryError(String),

    #[error("Contrainte d'unicité violée : {0}")]
    UniqueConstraintViolation(String),

    #[error("Référence invalide : {0}")]
    ForeignKeyViolation(String),

    // ===== 数据质量错误 =====
    #[error("Données invalides : {0}")]
    ValidationError(String),

    // ===== 通用错误 =====
    #[error("Erreur interne : {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for RepositoryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        RepositoryError::LockError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
