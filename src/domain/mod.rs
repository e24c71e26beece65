// ==========================================
// 图书馆流通管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod book;
pub mod circulation;
pub mod fine;
pub mod import;
pub mod member;
pub mod types;

// 重导出核心类型
pub use book::{Author, Book, BookAuthor, Category, CopyInventory};
pub use circulation::{BorrowRecord, Reservation};
pub use fine::Fine;
pub use import::{DqLevel, DqSummary, DqViolation, ImportReport, RawBookRecord};
pub use member::Member;
pub use types::{CirculationEvent, FineStatus};
