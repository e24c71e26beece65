// ==========================================
// 图书馆流通管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换仓储/引擎错误为用户友好的错误消息
// 红线: 错误信息必须包含显式原因（id、字段、冲突对象）
// ==========================================

use crate::engine::CirculationError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 流通业务错误
    // ==========================================
    /// 可借册数耗尽（借出请求被原子扣减拒绝）
    #[error("图书不可借: {0}")]
    BookUnavailable(String),

    /// 归还请求命中已归还记录
    #[error("记录已归还: {0}")]
    AlreadyReturned(String),

    /// 瞬态数据库竞争重试耗尽
    #[error("操作重试失败: {0}")]
    RetryExhausted(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

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
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 配置错误
    // ==========================================
    #[error("配置读写失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::CopiesExhausted { book_id } => {
                ApiError::BookUnavailable(format!("图书(id={})当前无可借册数", book_id))
            }
            RepositoryError::AlreadyReturned { record_id } => {
                ApiError::AlreadyReturned(format!("借阅记录(id={})此前已归还", record_id))
            }
            RepositoryError::DatabaseBusy(msg) => {
                ApiError::DatabaseError(format!("数据库忙: {}", msg))
            }

            // 数据库错误
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
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 CirculationError 转换
// 目的: 引擎已区分的流通结果按类别映射，不降级为字符串
// ==========================================
impl From<CirculationError> for ApiError {
    fn from(err: CirculationError) -> Self {
        match err {
            CirculationError::BookNotFound { book_id } => {
                ApiError::NotFound(format!("Book(id={})不存在", book_id))
            }
            CirculationError::MemberNotFound { member_id } => {
                ApiError::NotFound(format!("Member(id={})不存在", member_id))
            }
            CirculationError::RecordNotFound { record_id } => {
                ApiError::NotFound(format!("BorrowRecord(id={})不存在", record_id))
            }
            CirculationError::BookUnavailable { book_id } => {
                ApiError::BookUnavailable(format!("图书(id={})当前无可借册数", book_id))
            }
            CirculationError::AlreadyReturned { record_id } => {
                ApiError::AlreadyReturned(format!("借阅记录(id={})此前已归还", record_id))
            }
            CirculationError::Retryable {
                operation,
                attempts,
            } => ApiError::RetryExhausted(format!("{}重试{}次后仍然失败", operation, attempts)),
            CirculationError::ConfigError(msg) => ApiError::ConfigError(msg),
            CirculationError::Repository(repo_err) => repo_err.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        // NotFound错误转换
        let repo_err = RepositoryError::NotFound {
            entity: "Book".to_string(),
            id: "B001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Book"));
                assert!(msg.contains("B001"));
            }
            _ => panic!("Expected NotFound"),
        }

        // CopiesExhausted转换
        let repo_err = RepositoryError::CopiesExhausted {
            book_id: "B002".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::BookUnavailable(msg) => {
                assert!(msg.contains("B002"));
                assert!(msg.contains("无可借册数"));
            }
            _ => panic!("Expected BookUnavailable"),
        }
    }

    #[test]
    fn test_circulation_error_conversion() {
        // 引擎层已归还错误保持类别
        let circ_err = CirculationError::AlreadyReturned {
            record_id: "R001".to_string(),
        };
        let api_err: ApiError = circ_err.into();
        match api_err {
            ApiError::AlreadyReturned(msg) => assert!(msg.contains("R001")),
            _ => panic!("Expected AlreadyReturned"),
        }

        // 重试耗尽带操作名与次数
        let circ_err = CirculationError::Retryable {
            operation: "borrow_book".to_string(),
            attempts: 3,
        };
        let api_err: ApiError = circ_err.into();
        match api_err {
            ApiError::RetryExhausted(msg) => {
                assert!(msg.contains("borrow_book"));
                assert!(msg.contains('3'));
            }
            _ => panic!("Expected RetryExhausted"),
        }
    }

    #[test]
    fn test_nested_repository_error_passes_through() {
        // 引擎透传的仓储错误走 RepositoryError 的映射
        let circ_err = CirculationError::Repository(RepositoryError::UniqueConstraintViolation(
            "book.isbn".to_string(),
        ));
        let api_err: ApiError = circ_err.into();
        match api_err {
            ApiError::BusinessRuleViolation(msg) => assert!(msg.contains("book.isbn")),
            _ => panic!("Expected BusinessRuleViolation"),
        }
    }
}
