// ==========================================
// 图书馆流通管理系统 - 流通领域模型
// ==========================================
// 职责: 借阅记录与预约实体
// 红线: return_date 一旦写入即不可变更，记录不复用
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// BorrowRecord - 借阅记录
// ==========================================
// return_date 为 NULL 表示"在借"(active)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub record_id: String,              // 记录ID (UUID)
    pub member_id: String,              // 读者ID
    pub book_id: String,                // 图书ID
    pub borrow_date: DateTime<Utc>,     // 借出时间 (默认创建时刻)
    pub return_date: Option<NaiveDate>, // 归还日期 (NULL=在借)
}

impl BorrowRecord {
    /// 新建在借记录
    pub fn new(member_id: &str, book_id: &str, borrow_date: DateTime<Utc>) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            book_id: book_id.to_string(),
            borrow_date,
            return_date: None,
        }
    }

    /// 是否在借（尚未归还）
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// 借出至今经过的整天数
    ///
    /// # 参数
    /// - `today`: 当前日期
    ///
    /// # 返回
    /// 整数天数差（按日历日计算，不足一天不计）
    pub fn elapsed_days(&self, today: NaiveDate) -> i64 {
        (today - self.borrow_date.date_naive()).num_days()
    }
}

// ==========================================
// Reservation - 预约
// ==========================================
// 仅表达"存在性"，不含履约/取消状态机
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,      // 预约ID (UUID)
    pub member_id: String,           // 读者ID
    pub book_id: String,             // 图书ID
    pub reservation_date: NaiveDate, // 预约日期
}

impl Reservation {
    /// 新建预约
    pub fn new(member_id: &str, book_id: &str, reservation_date: NaiveDate) -> Self {
        Self {
            reservation_id: uuid::Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            book_id: book_id.to_string(),
            reservation_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_elapsed_days_whole_calendar_days() {
        let borrowed = Utc.with_ymd_and_hms(2026, 1, 1, 23, 50, 0).unwrap();
        let record = BorrowRecord::new("m-1", "b-1", borrowed);

        let today = NaiveDate::from_ymd_opt(2026, 1, 16).unwrap();
        assert_eq!(record.elapsed_days(today), 15, "按日历日差计算");
        assert!(record.is_active());
    }
}
