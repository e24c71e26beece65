// ==========================================
// 图书馆流通管理系统 - 导入层
// ==========================================
// 职责: 外部数据导入，生成馆藏数据
// 支持: CSV
// ==========================================

// 模块声明
pub mod catalog_importer;
pub mod error;

// 重导出核心类型
pub use catalog_importer::CatalogImporter;
pub use error::ImportError;
