// ==========================================
// 图书馆流通管理系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合流通引擎所需的所有 Repository
// 目标: 减少 CirculationEngine 的构造函数参数数量
// ==========================================

use std::sync::Arc;

use crate::repository::{
    BookRepository, BorrowRecordRepository, FineRepository, MemberRepository,
    ReservationRepository,
};

/// 流通引擎仓储集合
///
/// 聚合流通引擎所需的所有 Repository，简化依赖注入。
///
/// # 包含的仓储
/// - `book_repo`: 图书（可借册数计数器所在表）
/// - `member_repo`: 读者（借阅/预约前的存在性校验）
/// - `borrow_repo`: 借阅记录（借/还原子操作）
/// - `reservation_repo`: 预约
/// - `fine_repo`: 罚款台账
#[derive(Clone)]
pub struct CirculationRepositories {
    /// 图书仓储
    pub book_repo: Arc<BookRepository>,
    /// 读者仓储
    pub member_repo: Arc<MemberRepository>,
    /// 借阅记录仓储
    pub borrow_repo: Arc<BorrowRecordRepository>,
    /// 预约仓储
    pub reservation_repo: Arc<ReservationRepository>,
    /// 罚款台账仓储
    pub fine_repo: Arc<FineRepository>,
}

impl CirculationRepositories {
    /// 创建新的仓储集合
    pub fn new(
        book_repo: Arc<BookRepository>,
        member_repo: Arc<MemberRepository>,
        borrow_repo: Arc<BorrowRecordRepository>,
        reservation_repo: Arc<ReservationRepository>,
        fine_repo: Arc<FineRepository>,
    ) -> Self {
        Self {
            book_repo,
            member_repo,
            borrow_repo,
            reservation_repo,
            fine_repo,
        }
    }
}

// 注: 各 Repository 的构造需要数据库连接，本聚合结构体的
// 正确性由集成测试和 CirculationEngine 的测试来验证。
