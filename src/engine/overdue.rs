// ==========================================
// 图书馆流通管理系统 - 逾期判定引擎
// ==========================================
// 职责: 纯规则计算，判定借阅记录是否逾期并给出罚款评估
// 红线: 本模块不访问数据库，只做内存计算
// 说明: 逾期判定的唯一标准是"借出天数严格大于借期"
// ==========================================

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::BorrowRecord;

/// 逾期评估结果
///
/// 由 `OverdueEngine::evaluate` 产出，描述一条逾期借阅记录
/// 应当开出的罚款。罚款金额为固定值，不随逾期天数累加。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdueAssessment {
    /// 逾期的借阅记录ID
    pub record_id: String,
    /// 读者ID
    pub member_id: String,
    /// 已借出的整天数（从借出日到评估日）
    pub days_overdue: i64,
    /// 应开罚款金额
    pub fine_amount: f64,
}

/// 逾期判定引擎
///
/// 持有借期与罚款金额两个规则参数，提供纯函数式的逾期判定。
/// 参数来源于配置子系统（loan_period_days / overdue_fine_amount），
/// 由调用方在每次流通操作时读取并传入，保证配置修改即时生效。
#[derive(Debug, Clone)]
pub struct OverdueEngine {
    /// 借期（天）。借出超过该天数即为逾期
    loan_period_days: i64,
    /// 逾期罚款金额（固定值）
    fine_amount: f64,
}

impl OverdueEngine {
    /// 创建逾期判定引擎
    ///
    /// # 参数
    /// - `loan_period_days`: 借期天数
    /// - `fine_amount`: 逾期罚款金额
    pub fn new(loan_period_days: i64, fine_amount: f64) -> Self {
        Self {
            loan_period_days,
            fine_amount,
        }
    }

    /// 借期天数
    pub fn loan_period_days(&self) -> i64 {
        self.loan_period_days
    }

    /// 罚款金额
    pub fn fine_amount(&self) -> f64 {
        self.fine_amount
    }

    /// 判定一条借阅记录在指定日期是否逾期
    ///
    /// 规则: 借出整天数严格大于借期才算逾期。
    /// 恰好等于借期的记录（第 N 天归还，N = 借期）不逾期。
    /// 已归还的记录永不逾期。
    pub fn is_overdue(&self, record: &BorrowRecord, today: NaiveDate) -> bool {
        if !record.is_active() {
            return false;
        }
        record.elapsed_days(today) > self.loan_period_days
    }

    /// 逾期日期阈值
    ///
    /// 借出日期早于该阈值的在借记录即为逾期，
    /// 与 `is_overdue` 的逐条判定等价。用于批量扫描时
    /// 把判定条件下推到 SQL 的日期比较。
    pub fn overdue_threshold(&self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.loan_period_days)
    }

    /// 评估一条借阅记录，逾期则产出罚款评估
    ///
    /// # 返回
    /// - `Some(OverdueAssessment)`: 记录逾期，包含应开罚款
    /// - `None`: 记录未逾期或已归还
    pub fn evaluate(&self, record: &BorrowRecord, today: NaiveDate) -> Option<OverdueAssessment> {
        if !self.is_overdue(record, today) {
            return None;
        }
        Some(OverdueAssessment {
            record_id: record.record_id.clone(),
            member_id: record.member_id.clone(),
            days_overdue: record.elapsed_days(today),
            fine_amount: self.fine_amount,
        })
    }
}

// ==========================================
// 单元测试
// ==========================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
    }

    fn engine() -> OverdueEngine {
        OverdueEngine::new(14, 5.0)
    }

    /// 构造一条指定借出日期的在借记录
    fn active_record(year: i32, month: u32, day: u32) -> BorrowRecord {
        BorrowRecord {
            record_id: "rec-001".to_string(),
            member_id: "mem-001".to_string(),
            book_id: "book-001".to_string(),
            borrow_date: Utc.with_ymd_and_hms(year, month, day, 10, 30, 0).unwrap(),
            return_date: None,
        }
    }

    #[test]
    fn test_scenario_1_within_loan_period_not_overdue() {
        // 借出 10 天，借期 14 天，不逾期
        let record = active_record(2024, 6, 10);
        assert!(!engine().is_overdue(&record, today()), "借期内不应判定为逾期");
        assert!(engine().evaluate(&record, today()).is_none());
    }

    #[test]
    fn test_scenario_2_exactly_loan_period_not_overdue() {
        // 恰好借出 14 天（等于借期），边界上不逾期
        let record = active_record(2024, 6, 6);
        assert_eq!(record.elapsed_days(today()), 14);
        assert!(
            !engine().is_overdue(&record, today()),
            "恰好等于借期的记录不应判定为逾期"
        );
    }

    #[test]
    fn test_scenario_3_one_day_past_loan_period_overdue() {
        // 借出 15 天，超过借期 1 天，逾期
        let record = active_record(2024, 6, 5);
        let assessment = engine()
            .evaluate(&record, today())
            .expect("超期记录应产出罚款评估");
        assert_eq!(assessment.days_overdue, 15, "逾期天数应为借出整天数");
        assert_eq!(assessment.fine_amount, 5.0, "罚款为固定金额");
        assert_eq!(assessment.record_id, "rec-001");
        assert_eq!(assessment.member_id, "mem-001");
    }

    #[test]
    fn test_scenario_4_returned_record_never_overdue() {
        // 已归还的记录即使借出很久也不逾期
        let mut record = active_record(2024, 1, 1);
        record.return_date = Some(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert!(!engine().is_overdue(&record, today()), "已归还记录不应判定为逾期");
        assert!(engine().evaluate(&record, today()).is_none());
    }

    #[test]
    fn test_scenario_5_fixed_fine_regardless_of_days() {
        // 逾期 1 天与逾期 100 天的罚款金额相同
        let slightly_late = active_record(2024, 6, 5);
        let very_late = active_record(2024, 2, 1);
        let a1 = engine().evaluate(&slightly_late, today()).unwrap();
        let a2 = engine().evaluate(&very_late, today()).unwrap();
        assert_eq!(a1.fine_amount, a2.fine_amount, "罚款金额不随逾期天数累加");
        assert!(a2.days_overdue > a1.days_overdue);
    }

    #[test]
    fn test_scenario_6_threshold_matches_per_record_rule() {
        // SQL 下推用的日期阈值与逐条判定等价:
        // borrow_date < threshold  <=>  elapsed_days > loan_period
        let eng = engine();
        let threshold = eng.overdue_threshold(today());
        assert_eq!(threshold, NaiveDate::from_ymd_opt(2024, 6, 6).unwrap());

        // 借出日恰为阈值当天 => 不逾期
        let on_threshold = active_record(2024, 6, 6);
        assert!(!eng.is_overdue(&on_threshold, today()));
        assert!(on_threshold.borrow_date.date_naive() >= threshold);

        // 借出日早于阈值 => 逾期
        let before_threshold = active_record(2024, 6, 5);
        assert!(eng.is_overdue(&before_threshold, today()));
        assert!(before_threshold.borrow_date.date_naive() < threshold);
    }

    #[test]
    fn test_scenario_7_zero_loan_period() {
        // 借期为 0: 当天借出不逾期，隔天即逾期
        let eng = OverdueEngine::new(0, 5.0);
        let borrowed_today = active_record(2024, 6, 20);
        assert!(!eng.is_overdue(&borrowed_today, today()));

        let borrowed_yesterday = active_record(2024, 6, 19);
        assert!(eng.is_overdue(&borrowed_yesterday, today()));
    }
}
