// ==========================================
// 图书馆流通管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_repo;
pub mod circulation_repo;
pub mod error;
pub mod fine_repo;
pub mod import_repo;
pub mod import_repo_impl;
pub mod member_repo;
pub mod report_repo;

// 重导出核心仓储
pub use catalog_repo::{AuthorRepository, BookRepository, CategoryRepository};
pub use circulation_repo::{BorrowRecordRepository, ReservationRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use fine_repo::FineRepository;
pub use import_repo::CatalogImportRepository;
pub use import_repo_impl::CatalogImportRepositoryImpl;
pub use member_repo::MemberRepository;
pub use report_repo::{
    ActiveBorrowRow, MemberFineSummaryRow, OverdueBookRow, ReportRepository,
};
