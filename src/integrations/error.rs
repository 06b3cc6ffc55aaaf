// ==========================================
// Agenda 导入 - 外部集成错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 重试耗尽后最后一次错误原样返回调用方
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntegrationError {
    // ===== 配置 =====
    #[error("Clé API manquante pour {0}")]
    MissingApiKey(&'static str),

    // ===== 网络 / HTTP =====
    #[error("Erreur réseau : {0}")]
    Network(String),

    #[error("Réponse HTTP {status} : {message}")]
    Http { status: u16, message: String },

    // ===== 响应内容 =====
    #[error("Réponse invalide : {0}")]
    InvalidResponse(String),

    #[error("Décodage JSON impossible : {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => IntegrationError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => IntegrationError::Network(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type IntegrationResult<T> = Result<T, IntegrationError>;
