// ==========================================
// 图书馆流通管理系统 - 流通引擎
// ==========================================
// 职责: 借出/归还/预约的业务规则与原子状态变更编排
// 红线1: 可借册数与借阅记录的变更必须同事务提交
// 红线2: 每条借阅记录每个逾期区间至多下发一笔罚款
// 红线3: 失败路径不留下任何可观测的部分变更
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::ConfigManager;
use crate::domain::types::CirculationEvent;
use crate::domain::{BorrowRecord, Fine, Reservation};
use crate::engine::error::{CirculationError, CirculationResult};
use crate::engine::overdue::OverdueEngine;
use crate::engine::repositories::CirculationRepositories;
use crate::repository::error::RepositoryResult;

// ==========================================
// CirculationTuning - 锁竞争重试参数
// ==========================================
// 代码级参数，不入 config_kv（调用方按部署形态覆写）
#[derive(Debug, Clone)]
pub struct CirculationTuning {
    /// 单次操作的最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 每次重试前的退避时长（毫秒）
    pub busy_backoff_ms: u64,
}

impl Default for CirculationTuning {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            busy_backoff_ms: 25,
        }
    }
}

// ==========================================
// 操作结果类型
// ==========================================

/// 归还结果
///
/// `fine` 仅在本次调用实际下发罚款时为 Some；
/// 该记录此前已被巡检下发过罚款时为 None。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnOutcome {
    /// 归还后的借阅记录（return_date 已写入）
    pub record: BorrowRecord,
    /// 本次归还下发的逾期罚款
    pub fine: Option<Fine>,
}

/// 逾期巡检结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SweepResult {
    /// 扫描到的逾期且无罚款的在借记录数
    pub scanned: usize,
    /// 实际下发的罚款数
    pub issued: usize,
}

// ==========================================
// CirculationEngine - 流通引擎
// ==========================================

/// 流通引擎
///
/// 对外提供四个操作：borrow_book / return_book / reserve_book /
/// sweep_overdue。规则参数（借期、罚款金额）每次操作从配置现读，
/// 原子性由仓储层的单事务 CAS 操作保证，本引擎负责：
/// 读者/图书存在性预校验、逾期判定、SQLITE_BUSY 重试、结构化日志。
pub struct CirculationEngine {
    repos: CirculationRepositories,
    config: Arc<ConfigManager>,
    tuning: CirculationTuning,
}

impl CirculationEngine {
    /// 创建流通引擎（默认重试参数）
    pub fn new(repos: CirculationRepositories, config: Arc<ConfigManager>) -> Self {
        Self::with_tuning(repos, config, CirculationTuning::default())
    }

    /// 创建流通引擎（自定义重试参数）
    pub fn with_tuning(
        repos: CirculationRepositories,
        config: Arc<ConfigManager>,
        tuning: CirculationTuning,
    ) -> Self {
        Self {
            repos,
            config,
            tuning,
        }
    }

    /// 借出图书
    ///
    /// 校验读者存在后，在单事务内完成可借册数 CAS 扣减与
    /// 在借记录写入。
    ///
    /// # 参数
    /// - `member_id`: 读者ID
    /// - `book_id`: 图书ID
    ///
    /// # 返回
    /// - `Ok(BorrowRecord)`: 新的在借记录
    /// - `Err(MemberNotFound)` / `Err(BookNotFound)` / `Err(BookUnavailable)`
    #[instrument(skip(self), fields(member_id = %member_id, book_id = %book_id))]
    pub fn borrow_book(&self, member_id: &str, book_id: &str) -> CirculationResult<BorrowRecord> {
        if !self.repos.member_repo.exists(member_id)? {
            return Err(CirculationError::MemberNotFound {
                member_id: member_id.to_string(),
            });
        }

        let now = Utc::now();
        let record = self.with_busy_retry("borrow_book", || {
            self.repos
                .borrow_repo
                .borrow_with_decrement(member_id, book_id, now)
        })?;

        tracing::info!(
            event = %CirculationEvent::Borrow,
            record_id = %record.record_id,
            member_id,
            book_id,
            "图书借出"
        );
        Ok(record)
    }

    /// 归还图书
    ///
    /// 预读记录并完成逾期判定，随后在单事务内完成 return_date
    /// CAS 写入、可借册数回增、逾期罚款落库。borrow_date 写入后
    /// 不可变更，预读判定与事务提交之间不存在判定失效窗口。
    ///
    /// # 参数
    /// - `record_id`: 借阅记录ID
    ///
    /// # 返回
    /// - `Ok(ReturnOutcome)`: 归还后的记录与本次下发的罚款
    /// - `Err(RecordNotFound)` / `Err(AlreadyReturned)`
    #[instrument(skip(self), fields(record_id = %record_id))]
    pub fn return_book(&self, record_id: &str) -> CirculationResult<ReturnOutcome> {
        let record = self
            .repos
            .borrow_repo
            .find_by_id(record_id)?
            .ok_or_else(|| CirculationError::RecordNotFound {
                record_id: record_id.to_string(),
            })?;
        if !record.is_active() {
            return Err(CirculationError::AlreadyReturned {
                record_id: record_id.to_string(),
            });
        }

        let today = Utc::now().date_naive();
        let rules = self.overdue_rules()?;
        let assessment = rules.evaluate(&record, today);
        let fine = assessment.as_ref().map(|a| {
            Fine::for_overdue_record(&a.member_id, &a.record_id, a.fine_amount, today)
        });

        let fine_inserted = self.with_busy_retry("return_book", || {
            self.repos
                .borrow_repo
                .mark_returned_with_increment(record_id, today, fine.as_ref())
        })?;

        tracing::info!(
            event = %CirculationEvent::Return,
            record_id,
            member_id = %record.member_id,
            book_id = %record.book_id,
            "图书归还"
        );
        if fine_inserted {
            if let Some(a) = &assessment {
                tracing::info!(
                    event = %CirculationEvent::FineIssued,
                    record_id,
                    member_id = %a.member_id,
                    days_overdue = a.days_overdue,
                    amount = a.fine_amount,
                    "逾期罚款下发"
                );
            }
        }

        let mut returned = record;
        returned.return_date = Some(today);
        Ok(ReturnOutcome {
            record: returned,
            fine: if fine_inserted { fine } else { None },
        })
    }

    /// 预约图书
    ///
    /// 校验读者与图书存在后写入预约行。不检查可借册数，
    /// 允许同一读者对同一图书重复预约（无排队/履约策略）。
    ///
    /// # 参数
    /// - `member_id`: 读者ID
    /// - `book_id`: 图书ID
    #[instrument(skip(self), fields(member_id = %member_id, book_id = %book_id))]
    pub fn reserve_book(&self, member_id: &str, book_id: &str) -> CirculationResult<Reservation> {
        if !self.repos.member_repo.exists(member_id)? {
            return Err(CirculationError::MemberNotFound {
                member_id: member_id.to_string(),
            });
        }
        if self.repos.book_repo.find_by_id(book_id)?.is_none() {
            return Err(CirculationError::BookNotFound {
                book_id: book_id.to_string(),
            });
        }

        let reservation = Reservation::new(member_id, book_id, Utc::now().date_naive());
        self.with_busy_retry("reserve_book", || {
            self.repos.reservation_repo.insert(&reservation)
        })?;

        tracing::info!(
            event = %CirculationEvent::Reserve,
            reservation_id = %reservation.reservation_id,
            member_id,
            book_id,
            "图书预约"
        );
        Ok(reservation)
    }

    /// 逾期巡检
    ///
    /// 批量扫描逾期且尚无罚款的在借记录并逐条下发罚款。
    /// 与归还路径并发竞争同一记录时，重复下发被 fine.record_id
    /// 唯一约束吸收，计数只统计实际写入的罚款。
    ///
    /// # 参数
    /// - `today`: 巡检基准日期
    #[instrument(skip(self), fields(today = %today))]
    pub fn sweep_overdue(&self, today: NaiveDate) -> CirculationResult<SweepResult> {
        let rules = self.overdue_rules()?;
        let threshold = rules.overdue_threshold(today);
        let candidates = self.repos.borrow_repo.list_overdue_without_fine(threshold)?;

        let scanned = candidates.len();
        let mut issued = 0usize;
        for record in &candidates {
            if let Some(assessment) = rules.evaluate(record, today) {
                let fine = Fine::for_overdue_record(
                    &assessment.member_id,
                    &assessment.record_id,
                    assessment.fine_amount,
                    today,
                );
                let inserted = self.with_busy_retry("sweep_overdue", || {
                    self.repos.fine_repo.insert_if_absent(&fine)
                })?;
                if inserted {
                    issued += 1;
                    tracing::info!(
                        event = %CirculationEvent::FineIssued,
                        record_id = %assessment.record_id,
                        member_id = %assessment.member_id,
                        days_overdue = assessment.days_overdue,
                        amount = assessment.fine_amount,
                        "逾期罚款下发"
                    );
                }
            }
        }

        tracing::info!(scanned, issued, "逾期巡检完成");
        Ok(SweepResult { scanned, issued })
    }

    /// 按当前配置构造逾期判定规则
    fn overdue_rules(&self) -> CirculationResult<OverdueEngine> {
        let loan_period = self
            .config
            .get_loan_period_days()
            .map_err(|e| CirculationError::ConfigError(e.to_string()))?;
        let fine_amount = self
            .config
            .get_overdue_fine_amount()
            .map_err(|e| CirculationError::ConfigError(e.to_string()))?;
        Ok(OverdueEngine::new(loan_period, fine_amount))
    }

    /// 带退避的瞬态错误重试
    ///
    /// 仅对 DatabaseBusy 类瞬态错误重试；语义错误
    /// （CopiesExhausted / AlreadyReturned / NotFound）直接上抛。
    fn with_busy_retry<T, F>(&self, operation: &str, mut attempt_fn: F) -> CirculationResult<T>
    where
        F: FnMut() -> RepositoryResult<T>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match attempt_fn() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if attempts >= self.tuning.max_attempts {
                        tracing::warn!(operation, attempts, "锁竞争重试耗尽");
                        return Err(CirculationError::Retryable {
                            operation: operation.to_string(),
                            attempts,
                        });
                    }
                    tracing::debug!(
                        operation,
                        attempts,
                        backoff_ms = self.tuning.busy_backoff_ms,
                        "数据库忙，退避后重试"
                    );
                    std::thread::sleep(Duration::from_millis(self.tuning.busy_backoff_ms));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
