// ==========================================
// 图书馆流通管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 馆藏流通引擎 (借/还/预约/罚款/报表)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能计时
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装与入口支撑
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    Author, Book, BookAuthor, BorrowRecord, Category, DqLevel, DqSummary, DqViolation, Fine,
    ImportReport, Member, RawBookRecord, Reservation,
};

// 引擎
pub use engine::{
    CirculationEngine, CirculationError, CirculationRepositories, OverdueEngine, ReturnOutcome,
    SweepResult,
};

// API
pub use api::{
    ApiError, ApiResult, CatalogApi, CirculationApi, ConfigApi, ImportApi, MemberApi, ReportApi,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "图书馆流通管理系统";
