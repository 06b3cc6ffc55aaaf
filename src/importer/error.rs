// ==========================================
// Agenda 导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 只有整体性失败（文件/解析/配置）走错误通道;
//       行级错误以文本形式累积在 ImportResult 中
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("Fichier introuvable : {0}")]
    FileNotFound(String),

    #[error("Format de fichier non supporté : {0} (seuls .xlsx/.xls/.csv sont acceptés)")]
    UnsupportedFormat(String),

    #[error("Le fichier est vide : {0}")]
    EmptyFile(String),

    #[error("Lecture du fichier impossible : {0}")]
    FileReadError(String),

    #[error("Erreur d'analyse Excel : {0}")]
    ExcelParseError(String),

    #[error("Erreur d'analyse CSV : {0}")]
    CsvParseError(String),

    // ===== 模板 =====
    #[error("Génération du modèle impossible : {0}")]
    TemplateError(String),

    // ===== 持久化 =====
    #[error("Erreur de persistance : {0}")]
    Repository(#[from] crate::repository::RepositoryError),

    // ===== 通用错误 =====
    #[error("Erreur interne : {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::TemplateError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportOutcome<T> = Result<T, ImportError>;
