// ==========================================
// 港口到港舱单系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户可读的错误消息
// HTTP 状态码映射见 app::http_routes::common
// ==========================================

use crate::auth::AuthError;
use crate::domain::import::RowRejected;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::storage::StorageError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因（定位到表 / 列 / 行）
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 认证 / 授权错误
    // ==========================================
    #[error("未认证: {0}")]
    Unauthorized(String),

    #[error("无权限: {0}")]
    Forbidden(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("资源冲突: {0}")]
    Conflict(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("舱单文件格式错误: {0}")]
    DocumentFormatError(String),

    /// 整单模式下的行拒收（明细随响应返回）
    #[error("舱单导入被拒绝: {message}")]
    RowsRejected {
        message: String,
        rejected: Vec<RowRejected>,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::DocumentFormatError(_) => "FORMAT_ERROR",
            ApiError::RowsRejected { .. } => "ROWS_REJECTED",
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// 附加明细（仅行拒收携带）
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::RowsRejected { rejected, .. } => serde_json::to_value(rejected).ok(),
            _ => None,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::Conflict(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        if err.is_format_error() {
            return ApiError::DocumentFormatError(err.to_string());
        }
        match err {
            ImportError::RowsRejected(rejected) => {
                let message = ImportError::RowsRejected(rejected.clone()).to_string();
                ApiError::RowsRejected { message, rejected }
            }
            ImportError::InvalidHeader(msg) => ApiError::ValidationError(msg),
            ImportError::NoDocuments => ApiError::InvalidInput(ImportError::NoDocuments.to_string()),
            ImportError::InvalidLayout(msg) => ApiError::InternalError(format!("表格布局配置无效: {}", msg)),
            ImportError::Persistence(repo_err) => ApiError::from(repo_err),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::ExpiredToken => ApiError::Unauthorized(err.to_string()),
            AuthError::Encoding(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
