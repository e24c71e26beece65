// ==========================================
// 图书馆流通管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 CLI 与上层调用
// ==========================================

pub mod catalog_api;
pub mod circulation_api;
pub mod config_api;
pub mod error;
pub mod import_api;
pub mod member_api;
pub mod report_api;

// 重导出核心类型
pub use catalog_api::{CatalogApi, CreateBookRequest};
pub use circulation_api::{CirculationApi, ReturnResponse};
pub use config_api::{ConfigApi, ConfigItem};
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
pub use member_api::MemberApi;
pub use report_api::ReportApi;
