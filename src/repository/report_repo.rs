// ==========================================
// 图书馆流通管理系统 - 报表查询仓储
// ==========================================
// 职责: 只读派生视图（在借/逾期/读者罚款汇总）
// 红线: 只 SELECT，不产生任何写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ==========================================
// ActiveBorrowRow - 在借视图行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBorrowRow {
    pub record_id: String,          // 借阅记录ID
    pub member_id: String,          // 读者ID
    pub member_name: String,        // 读者姓名
    pub book_id: String,            // 图书ID
    pub book_title: String,         // 书名
    pub borrow_date: DateTime<Utc>, // 借出时间
}

// ==========================================
// OverdueBookRow - 逾期视图行
// ==========================================
// days_overdue 口径: 借出至今的整天数（非超出借期的天数）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueBookRow {
    pub record_id: String,          // 借阅记录ID
    pub member_id: String,          // 读者ID
    pub member_name: String,        // 读者姓名
    pub book_id: String,            // 图书ID
    pub book_title: String,         // 书名
    pub borrow_date: DateTime<Utc>, // 借出时间
    pub days_overdue: i64,          // 借出至今天数
}

// ==========================================
// MemberFineSummaryRow - 读者罚款汇总行
// ==========================================
// 内连接口径: 无未缴罚款的读者不出现（含罚款已全缴者）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberFineSummaryRow {
    pub member_id: String,   // 读者ID
    pub member_name: String, // 读者姓名
    pub unpaid_count: i64,   // 未缴笔数
    pub unpaid_total: f64,   // 未缴总额
}

pub struct ReportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在借视图: 全部未归还记录，联读者姓名与书名
    pub fn list_active_borrows(&self) -> RepositoryResult<Vec<ActiveBorrowRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT br.record_id, br.member_id, m.full_name,
                   br.book_id, b.title, br.borrow_date
              FROM borrow_record br
              JOIN member m ON m.member_id = br.member_id
              JOIN book b ON b.book_id = br.book_id
             WHERE br.return_date IS NULL
             ORDER BY br.borrow_date ASC, br.record_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ActiveBorrowRow {
                    record_id: row.get(0)?,
                    member_id: row.get(1)?,
                    member_name: row.get(2)?,
                    book_id: row.get(3)?,
                    book_title: row.get(4)?,
                    borrow_date: Self::parse_datetime(row, 5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 逾期视图: 在借中 borrow_date 早于阈值日期的记录
    ///
    /// # 参数
    /// - `threshold`: 逾期阈值日期（today - 借期天数），严格早于才算逾期
    /// - `today`: 当前日期，用于计算 days_overdue
    pub fn list_overdue_books(
        &self,
        threshold: NaiveDate,
        today: NaiveDate,
    ) -> RepositoryResult<Vec<OverdueBookRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT br.record_id, br.member_id, m.full_name,
                   br.book_id, b.title, br.borrow_date
              FROM borrow_record br
              JOIN member m ON m.member_id = br.member_id
              JOIN book b ON b.book_id = br.book_id
             WHERE br.return_date IS NULL
               AND DATE(br.borrow_date) < DATE(?1)
             ORDER BY br.borrow_date ASC, br.record_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![threshold.to_string()], |row| {
                let borrow_date = Self::parse_datetime(row, 5)?;
                Ok(OverdueBookRow {
                    record_id: row.get(0)?,
                    member_id: row.get(1)?,
                    member_name: row.get(2)?,
                    book_id: row.get(3)?,
                    book_title: row.get(4)?,
                    borrow_date,
                    days_overdue: (today - borrow_date.date_naive()).num_days(),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 读者罚款汇总: 按读者分组的未缴笔数与总额（内连接，无未缴者不出现）
    pub fn list_member_fine_summaries(&self) -> RepositoryResult<Vec<MemberFineSummaryRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT m.member_id, m.full_name,
                   COUNT(f.fine_id) AS unpaid_count,
                   SUM(f.amount) AS unpaid_total
              FROM member m
              JOIN fine f ON f.member_id = m.member_id AND f.paid = 0
             GROUP BY m.member_id, m.full_name
             ORDER BY unpaid_total DESC, m.member_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(MemberFineSummaryRow {
                    member_id: row.get(0)?,
                    member_name: row.get(1)?,
                    unpaid_count: row.get(2)?,
                    unpaid_total: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 解析 RFC3339 时间列
    fn parse_datetime(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        row.get::<_, String>(idx)?
            .parse::<DateTime<Utc>>()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }
}
