// ==========================================
// 图书馆流通管理系统 - 流通 API
// ==========================================
// 职责: 借出/归还/预约/逾期巡检的对外入口
// 红线: 不在本层做库存判定，可借性只由引擎的原子扣减裁决
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::circulation::{BorrowRecord, Reservation};
use crate::domain::fine::Fine;
use crate::engine::{CirculationEngine, SweepResult};

// ==========================================
// ReturnResponse - 归还结果
// ==========================================
/// 归还接口返回值（归还后的记录 + 本次实际开出的罚款）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnResponse {
    pub record: BorrowRecord,
    /// 仅当本次归还事务真正写入罚款时为 Some
    pub fine: Option<Fine>,
}

// ==========================================
// CirculationApi - 流通 API
// ==========================================

/// 流通API
///
/// 职责：
/// 1. 借出（读者校验 + 原子扣减可借册数）
/// 2. 归还（原子回写 + 逾期罚款开具）
/// 3. 预约登记
/// 4. 逾期巡检（批量补开罚款）
pub struct CirculationApi {
    engine: Arc<CirculationEngine>,
}

impl CirculationApi {
    /// 创建新的CirculationApi实例
    ///
    /// # 参数
    /// - engine: 流通引擎（持有全部仓储与配置）
    pub fn new(engine: Arc<CirculationEngine>) -> Self {
        Self { engine }
    }

    // ==========================================
    // 流通操作
    // ==========================================

    /// 借出一册图书
    ///
    /// # 参数
    /// - member_id: 读者ID
    /// - book_id: 图书ID
    ///
    /// # 返回
    /// - Ok(BorrowRecord): 新建的在借记录
    /// - Err(ApiError::NotFound): 读者或图书不存在
    /// - Err(ApiError::BookUnavailable): 可借册数已耗尽
    pub fn borrow_book(&self, member_id: &str, book_id: &str) -> ApiResult<BorrowRecord> {
        let _perf = crate::perf::PerfGuard::new("api.borrow_book");

        // 参数验证
        if member_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("读者ID不能为空".to_string()));
        }
        if book_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("图书ID不能为空".to_string()));
        }

        debug!(member_id = %member_id, book_id = %book_id, "借出请求");
        Ok(self.engine.borrow_book(member_id, book_id)?)
    }

    /// 归还一册图书
    ///
    /// # 参数
    /// - record_id: 借阅记录ID
    ///
    /// # 返回
    /// - Ok(ReturnResponse): 归还后的记录与本次开出的罚款（如有）
    /// - Err(ApiError::AlreadyReturned): 该记录此前已归还
    pub fn return_book(&self, record_id: &str) -> ApiResult<ReturnResponse> {
        let _perf = crate::perf::PerfGuard::new("api.return_book");

        if record_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("借阅记录ID不能为空".to_string()));
        }

        debug!(record_id = %record_id, "归还请求");
        let outcome = self.engine.return_book(record_id)?;
        Ok(ReturnResponse {
            record: outcome.record,
            fine: outcome.fine,
        })
    }

    /// 预约一册图书
    ///
    /// 同一读者对同一图书允许重复预约，本层不做去重。
    ///
    /// # 参数
    /// - member_id: 读者ID
    /// - book_id: 图书ID
    pub fn reserve_book(&self, member_id: &str, book_id: &str) -> ApiResult<Reservation> {
        let _perf = crate::perf::PerfGuard::new("api.reserve_book");

        if member_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("读者ID不能为空".to_string()));
        }
        if book_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("图书ID不能为空".to_string()));
        }

        debug!(member_id = %member_id, book_id = %book_id, "预约请求");
        Ok(self.engine.reserve_book(member_id, book_id)?)
    }

    /// 逾期巡检：为所有逾期且未开罚款的在借记录补开罚款
    ///
    /// 巡检日期取当前 UTC 日期；幂等，重复执行不会重复开具。
    ///
    /// # 返回
    /// - Ok(SweepResult): 扫描条数与实际开具条数
    pub fn sweep_overdue(&self) -> ApiResult<SweepResult> {
        let _perf = crate::perf::PerfGuard::new("api.sweep_overdue");

        let today = Utc::now().date_naive();
        debug!(date = %today, "逾期巡检请求");
        Ok(self.engine.sweep_overdue(today)?)
    }
}
