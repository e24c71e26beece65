// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用测试环境与数据准备
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use tempfile::NamedTempFile;

use library_circulation::api::{
    CatalogApi, CirculationApi, ConfigApi, CreateBookRequest, ImportApi, MemberApi, ReportApi,
};
use library_circulation::config::config_manager::ConfigManager;
use library_circulation::domain::{Book, BorrowRecord, Member};
use library_circulation::engine::{CirculationEngine, CirculationRepositories};
use library_circulation::repository::{
    AuthorRepository, BookRepository, BorrowRecordRepository, CategoryRepository, FineRepository,
    MemberRepository, ReportRepository, ReservationRepository,
};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖，
/// 底层为同一个临时数据库文件上的共享连接
pub struct ApiTestEnv {
    pub db_path: String,

    pub catalog_api: Arc<CatalogApi>,
    pub member_api: Arc<MemberApi>,
    pub circulation_api: Arc<CirculationApi>,
    pub report_api: Arc<ReportApi>,
    pub config_api: Arc<ConfigApi>,
    pub import_api: Arc<ImportApi>,

    // Repository层（用于测试数据准备）
    pub book_repo: Arc<BookRepository>,
    pub author_repo: Arc<AuthorRepository>,
    pub category_repo: Arc<CategoryRepository>,
    pub member_repo: Arc<MemberRepository>,
    pub borrow_repo: Arc<BorrowRecordRepository>,
    pub reservation_repo: Arc<ReservationRepository>,
    pub fine_repo: Arc<FineRepository>,

    pub config_manager: Arc<ConfigManager>,
    pub engine: Arc<CirculationEngine>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境
    ///
    /// # 说明
    /// - 使用临时数据库文件
    /// - 初始化所有Repository、Engine和API（建表在仓储构造时完成）
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) =
            test_helpers::create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;

        let conn = library_circulation::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

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

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let engine = Arc::new(CirculationEngine::new(
            CirculationRepositories::new(
                book_repo.clone(),
                member_repo.clone(),
                borrow_repo.clone(),
                reservation_repo.clone(),
                fine_repo.clone(),
            ),
            config_manager.clone(),
        ));

        let catalog_api = Arc::new(CatalogApi::new(
            book_repo.clone(),
            author_repo.clone(),
            category_repo.clone(),
        ));
        let member_api = Arc::new(MemberApi::new(member_repo.clone()));
        let circulation_api = Arc::new(CirculationApi::new(engine.clone()));
        let report_api = Arc::new(ReportApi::new(report_repo, config_manager.clone()));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone()));
        let import_api = Arc::new(ImportApi::new(db_path.clone()));

        Ok(Self {
            db_path,
            catalog_api,
            member_api,
            circulation_api,
            report_api,
            config_api,
            import_api,
            book_repo,
            author_repo,
            category_repo,
            member_repo,
            borrow_repo,
            reservation_repo,
            fine_repo,
            config_manager,
            engine,
            _temp_file: temp_file,
        })
    }

    // ==========================================
    // 测试数据准备
    // ==========================================

    /// 注册一名读者
    pub fn seed_member(&self, name: &str, email: &str) -> Member {
        self.member_api
            .register_member(name, email, None)
            .expect("注册读者失败")
    }

    /// 入库一册图书
    pub fn seed_book(&self, title: &str, isbn: &str, copies: i64) -> Book {
        self.catalog_api
            .create_book(CreateBookRequest {
                title: title.to_string(),
                isbn: isbn.to_string(),
                category_id: None,
                published_year: None,
                copies,
            })
            .expect("图书入库失败")
    }

    /// 借出并把借出时间回拨指定天数（模拟既有在借记录）
    pub fn seed_backdated_borrow(
        &self,
        member_id: &str,
        book_id: &str,
        days_ago: i64,
    ) -> BorrowRecord {
        self.borrow_repo
            .borrow_with_decrement(member_id, book_id, Utc::now() - Duration::days(days_ago))
            .expect("借出失败")
    }
}
