// ==========================================
// 图书馆流通管理系统 - 引擎层错误类型
// ==========================================
// 职责: 定义流通引擎的调用方可区分错误，
//       转换 Repository 错误为流通语义错误
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 流通引擎错误类型
///
/// 全部为可恢复错误；任何失败路径之后都观察不到部分状态变更。
#[derive(Error, Debug)]
pub enum CirculationError {
    // ==========================================
    // 流通业务错误
    // ==========================================
    /// 图书不存在
    #[error("图书不存在: book_id={book_id}")]
    BookNotFound { book_id: String },

    /// 图书无可借册数
    #[error("图书无可借册数: book_id={book_id}")]
    BookUnavailable { book_id: String },

    /// 读者不存在
    #[error("读者不存在: member_id={member_id}")]
    MemberNotFound { member_id: String },

    /// 借阅记录不存在
    #[error("借阅记录不存在: record_id={record_id}")]
    RecordNotFound { record_id: String },

    /// 记录已归还（重复归还）
    #[error("记录已归还: record_id={record_id}")]
    AlreadyReturned { record_id: String },

    // ==========================================
    // 并发控制错误
    // ==========================================
    /// 锁竞争重试耗尽（瞬态，调用方可稍后再试）
    #[error("操作因数据库忙重试耗尽: operation={operation}, attempts={attempts}")]
    Retryable { operation: String, attempts: u32 },

    // ==========================================
    // 配置与数据访问错误
    // ==========================================
    #[error("配置读取失败: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 把仓储层的 CAS 失败翻译成流通语义错误
// ==========================================
impl From<RepositoryError> for CirculationError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::CopiesExhausted { book_id } => {
                CirculationError::BookUnavailable { book_id }
            }
            RepositoryError::AlreadyReturned { record_id } => {
                CirculationError::AlreadyReturned { record_id }
            }
            RepositoryError::NotFound { entity, id } => match entity.as_str() {
                "Book" => CirculationError::BookNotFound { book_id: id },
                "Member" => CirculationError::MemberNotFound { member_id: id },
                "BorrowRecord" => CirculationError::RecordNotFound { record_id: id },
                _ => CirculationError::Repository(RepositoryError::NotFound { entity, id }),
            },
            other => CirculationError::Repository(other),
        }
    }
}

/// Result 类型别名
pub type CirculationResult<T> = Result<T, CirculationError>;
