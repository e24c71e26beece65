// ==========================================
// 图书馆流通管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{
    CatalogApi, CirculationApi, ConfigApi, ImportApi, MemberApi, ReportApi,
};
use crate::config::config_manager::ConfigManager;
use crate::engine::{CirculationEngine, CirculationRepositories};
use crate::repository::{
    AuthorRepository, BookRepository, BorrowRecordRepository, CategoryRepository, FineRepository,
    MemberRepository, ReportRepository, ReservationRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
/// 在命令行入口中作为全局状态使用
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 馆藏目录API
    pub catalog_api: Arc<CatalogApi>,

    /// 读者管理API
    pub member_api: Arc<MemberApi>,

    /// 流通操作API
    pub circulation_api: Arc<CirculationApi>,

    /// 报表API
    pub report_api: Arc<ReportApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 馆藏导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享数据库连接并建表
    /// 2. 初始化所有Repository
    /// 3. 创建流通引擎和所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接，建表由各仓储的 ensure_table 完成）
        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================

        let book_repo = Arc::new(
            BookRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建BookRepository: {}", e))?,
        );
        let author_repo = Arc::new(
            AuthorRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建AuthorRepository: {}", e))?,
        );
        let category_repo = Arc::new(
            CategoryRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建CategoryRepository: {}", e))?,
        );
        let member_repo = Arc::new(
            MemberRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建MemberRepository: {}", e))?,
        );
        let borrow_repo = Arc::new(
            BorrowRecordRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建BorrowRecordRepository: {}", e))?,
        );
        let reservation_repo = Arc::new(
            ReservationRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ReservationRepository: {}", e))?,
        );
        let fine_repo = Arc::new(
            FineRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建FineRepository: {}", e))?,
        );
        let report_repo = Arc::new(
            ReportRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ReportRepository: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // 流通引擎
        let engine = Arc::new(CirculationEngine::new(
            CirculationRepositories::new(
                book_repo.clone(),
                member_repo.clone(),
                borrow_repo,
                reservation_repo,
                fine_repo,
            ),
            config_manager.clone(),
        ));

        // ==========================================
        // 初始化API层
        // ==========================================

        let catalog_api = Arc::new(CatalogApi::new(book_repo, author_repo, category_repo));
        let member_api = Arc::new(MemberApi::new(member_repo));
        let circulation_api = Arc::new(CirculationApi::new(engine));
        let report_api = Arc::new(ReportApi::new(report_repo, config_manager.clone()));
        let config_api = Arc::new(ConfigApi::new(config_manager));
        let import_api = Arc::new(ImportApi::new(db_path.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            catalog_api,
            member_api,
            circulation_api,
            report_api,
            config_api,
            import_api,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/library-circ-dev/library_circ.db
/// - 生产环境: 用户数据目录/library-circ/library_circ.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("LIBRARY_CIRC_DB") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 使用用户数据目录，避免把数据文件散落在当前工作目录。
    // 先给一个默认回退值，后续如果能拿到 data_dir 再覆盖。
    let mut path = PathBuf::from("./library_circ.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("library-circ-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("library-circ");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("library_circ.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CreateBookRequest;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_wiring() {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let db_path = db_file.path().to_string_lossy().to_string();
        let state = AppState::new(db_path).unwrap();

        let member = state
            .member_api
            .register_member("测试读者", "reader@example.com", None)
            .unwrap();
        let book = state
            .catalog_api
            .create_book(CreateBookRequest {
                title: "Rust 程序设计".to_string(),
                isbn: "978-7-121-11111-1".to_string(),
                category_id: None,
                published_year: Some(2023),
                copies: 1,
            })
            .unwrap();

        let record = state
            .circulation_api
            .borrow_book(&member.member_id, &book.book_id)
            .unwrap();
        assert!(record.is_active());

        let active = state.report_api.list_active_borrows().unwrap();
        assert_eq!(active.len(), 1);

        let outcome = state.circulation_api.return_book(&record.record_id).unwrap();
        assert!(outcome.record.return_date.is_some());
    }
}
