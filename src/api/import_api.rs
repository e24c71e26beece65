// ==========================================
// 图书馆流通管理系统 - 馆藏导入 API
// ==========================================
// 职责: 封装馆藏 CSV 导入入口
// ==========================================

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::import::{DqSummary, DqViolation};
use crate::importer::CatalogImporter;
use crate::repository::import_repo_impl::CatalogImportRepositoryImpl;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次ID（由导入器生成，用于违规明细追溯）
    pub batch_id: String,
    /// 新入库的图书数量
    pub imported: i64,
    /// 因 ISBN 冲突被跳过的行数
    pub conflicts: i64,
    /// DQ 汇总统计
    pub summary: DqSummary,
    /// DQ 违规明细
    pub violations: Vec<DqViolation>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 导入馆藏数据（异步入口）
    ///
    /// # 参数
    /// - file_path: CSV 文件路径
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果
    /// - Err(ApiError): 错误信息
    pub async fn import_catalog(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        let _perf = crate::perf::PerfGuard::new("api.import_catalog");

        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }
        if !file_path.ends_with(".csv") {
            return Err(ApiError::ImportError(
                "当前仅支持 .csv 格式文件导入".to_string(),
            ));
        }

        // 创建导入器
        let importer = self
            .create_importer()
            .map_err(|e| ApiError::ImportError(format!("创建导入器失败: {}", e)))?;

        // 执行导入
        let report = importer
            .import_from_csv(file_path)
            .await
            .map_err(|e| ApiError::ImportError(format!("导入失败: {}", e)))?;

        Ok(ImportApiResponse {
            batch_id: report.batch_id,
            imported: report.summary.imported as i64,
            conflicts: report.summary.conflict as i64,
            summary: report.summary,
            violations: report.violations,
            elapsed_ms: report.elapsed_ms,
        })
    }

    /// 导入馆藏数据（同步封装，供 CLI 等同步调用方使用）
    ///
    /// 已处于多线程 tokio 运行时内时借用该运行时执行，
    /// 否则临时创建运行时；不得在 current_thread 运行时内调用。
    pub fn import_catalog_blocking(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| {
                handle.block_on(async move { self.import_catalog(file_path).await })
            })
        } else {
            let rt = tokio::runtime::Runtime::new().map_err(|e| {
                ApiError::InternalError(format!("创建 tokio 运行时失败: {}", e))
            })?;
            rt.block_on(async move { self.import_catalog(file_path).await })
        }
    }

    /// 创建CatalogImporter实例（仓储与配置各自打开连接）
    fn create_importer(
        &self,
    ) -> Result<
        CatalogImporter<CatalogImportRepositoryImpl, ConfigManager>,
        Box<dyn std::error::Error>,
    > {
        let import_repo = CatalogImportRepositoryImpl::new(&self.db_path)?;
        let config = ConfigManager::new(&self.db_path)?;
        Ok(CatalogImporter::new(import_repo, config))
    }
}
