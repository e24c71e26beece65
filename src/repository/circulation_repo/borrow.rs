// ==========================================
// 图书馆流通管理系统 - 借阅记录仓储
// ==========================================
// 职责: 管理 borrow_record 表与可借册数计数器的原子操作
// 红线: 扣减/回增 copies_available 与记录写入同事务提交，
//       失败路径不留下任何可观测的部分变更
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::circulation::BorrowRecord;
use crate::domain::fine::Fine;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct BorrowRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BorrowRecordRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS borrow_record (
              record_id TEXT PRIMARY KEY,
              member_id TEXT NOT NULL REFERENCES member(member_id) ON DELETE CASCADE,
              book_id TEXT NOT NULL REFERENCES book(book_id) ON DELETE CASCADE,
              borrow_date TEXT NOT NULL,
              return_date TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_borrow_record_member
              ON borrow_record(member_id);
            CREATE INDEX IF NOT EXISTS idx_borrow_record_book
              ON borrow_record(book_id);
            "#,
        )?;
        Ok(())
    }

    /// 查询图书当前可借册数
    ///
    /// # 返回
    /// - `Some(n)`: 可借册数
    /// - `None`: 图书不存在
    pub fn get_availability(&self, book_id: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT copies_available FROM book WHERE book_id = ?1",
            params![book_id],
            |row| row.get::<_, i64>(0),
        );

        match result {
            Ok(n) => Ok(Some(n)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 借出: 扣减可借册数并写入在借记录（单事务）
    ///
    /// 先以 CAS 条件扣减（copies_available > 0 才命中），未命中行时
    /// 在同事务内区分"图书不存在"与"册数耗尽"，随后写入记录。
    ///
    /// # 参数
    /// - `member_id`: 读者ID（存在性由引擎预校验）
    /// - `book_id`: 图书ID
    /// - `now`: 借出时刻
    ///
    /// # 返回
    /// - `Ok(BorrowRecord)`: 新写入的在借记录
    /// - `Err(NotFound)`: 图书不存在
    /// - `Err(CopiesExhausted)`: 无可借册数
    pub fn borrow_with_decrement(
        &self,
        member_id: &str,
        book_id: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<BorrowRecord> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        // 1. CAS 扣减：仅当仍有可借册数时命中
        let rows_affected = tx.execute(
            r#"
            UPDATE book
               SET copies_available = copies_available - 1,
                   updated_at = ?2
             WHERE book_id = ?1 AND copies_available > 0
            "#,
            params![book_id, now.to_rfc3339()],
        )?;

        if rows_affected == 0 {
            // 2. 区分: 图书不存在 vs 册数耗尽
            let exists = tx
                .query_row(
                    "SELECT 1 FROM book WHERE book_id = ?1 LIMIT 1",
                    params![book_id],
                    |_row| Ok(true),
                )
                .optional()?
                .unwrap_or(false);

            return if exists {
                Err(RepositoryError::CopiesExhausted {
                    book_id: book_id.to_string(),
                })
            } else {
                Err(RepositoryError::NotFound {
                    entity: "Book".to_string(),
                    id: book_id.to_string(),
                })
            };
        }

        // 3. 写入在借记录
        let record = BorrowRecord::new(member_id, book_id, now);
        tx.execute(
            r#"
            INSERT INTO borrow_record (record_id, member_id, book_id, borrow_date, return_date)
            VALUES (?1, ?2, ?3, ?4, NULL)
            "#,
            params![
                record.record_id,
                record.member_id,
                record.book_id,
                record.borrow_date.to_rfc3339(),
            ],
        )?;

        tx.commit()?;
        Ok(record)
    }

    /// 归还: 写入归还日期并回增可借册数（单事务）
    ///
    /// 先以 CAS 条件写 return_date（仅 return_date IS NULL 命中），
    /// 未命中行时在同事务内区分"记录不存在"与"已归还"。
    /// 若该记录归还时已逾期，罚款条目在同事务内落库
    /// （INSERT OR IGNORE + fine.record_id 唯一约束实现每记录至多一罚）。
    ///
    /// # 参数
    /// - `record_id`: 借阅记录ID
    /// - `return_date`: 归还日期
    /// - `overdue_fine`: 逾期罚款（引擎在调用前完成判定，未逾期传 None）
    ///
    /// # 返回
    /// - `Ok(true)`: 罚款条目在本次事务中实际写入
    /// - `Ok(false)`: 未传罚款，或该记录已有罚款（INSERT 被唯一约束吸收）
    pub fn mark_returned_with_increment(
        &self,
        record_id: &str,
        return_date: NaiveDate,
        overdue_fine: Option<&Fine>,
    ) -> RepositoryResult<bool> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        // 1. CAS 写归还日期：仅在借记录命中
        let rows_affected = tx.execute(
            r#"
            UPDATE borrow_record
               SET return_date = ?2
             WHERE record_id = ?1 AND return_date IS NULL
            "#,
            params![record_id, return_date.to_string()],
        )?;

        if rows_affected == 0 {
            // 2. 区分: 记录不存在 vs 已归还
            let exists = tx
                .query_row(
                    "SELECT 1 FROM borrow_record WHERE record_id = ?1 LIMIT 1",
                    params![record_id],
                    |_row| Ok(true),
                )
                .optional()?
                .unwrap_or(false);

            return if exists {
                Err(RepositoryError::AlreadyReturned {
                    record_id: record_id.to_string(),
                })
            } else {
                Err(RepositoryError::NotFound {
                    entity: "BorrowRecord".to_string(),
                    id: record_id.to_string(),
                })
            };
        }

        // 3. 回增该书可借册数
        tx.execute(
            r#"
            UPDATE book
               SET copies_available = copies_available + 1,
                   updated_at = ?2
             WHERE book_id = (SELECT book_id FROM borrow_record WHERE record_id = ?1)
            "#,
            params![record_id, Utc::now().to_rfc3339()],
        )?;

        // 4. 逾期罚款同事务落库（重复下发被唯一约束吸收）
        let mut fine_inserted = false;
        if let Some(fine) = overdue_fine {
            let affected = tx.execute(
                r#"
                INSERT OR IGNORE INTO fine (fine_id, member_id, record_id, amount, issue_date, paid)
                VALUES (?1, ?2, ?3, ?4, ?5, 0)
                "#,
                params![
                    fine.fine_id,
                    fine.member_id,
                    fine.record_id,
                    fine.amount,
                    fine.issue_date.to_string(),
                ],
            )?;
            fine_inserted = affected > 0;
        }

        tx.commit()?;
        Ok(fine_inserted)
    }

    /// 按ID查询借阅记录
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<BorrowRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM borrow_record WHERE record_id = ?1",
            Self::COLUMNS
        ))?;

        let result = stmt.query_row(params![record_id], Self::map_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按ID查询在借记录（已归还视为不存在）
    pub fn find_active_by_id(&self, record_id: &str) -> RepositoryResult<Option<BorrowRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM borrow_record WHERE record_id = ?1 AND return_date IS NULL",
            Self::COLUMNS
        ))?;

        let result = stmt.query_row(params![record_id], Self::map_row);
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出全部在借记录（按借出时间排序）
    pub fn list_active(&self) -> RepositoryResult<Vec<BorrowRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM borrow_record WHERE return_date IS NULL ORDER BY borrow_date ASC, record_id ASC",
            Self::COLUMNS
        ))?;

        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 列出逾期且尚未产生罚款的在借记录（定时巡检用）
    ///
    /// # 参数
    /// - `threshold`: 逾期阈值日期，borrow_date 早于该日即逾期
    pub fn list_overdue_without_fine(
        &self,
        threshold: NaiveDate,
    ) -> RepositoryResult<Vec<BorrowRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
              FROM borrow_record br
             WHERE br.return_date IS NULL
               AND DATE(br.borrow_date) < DATE(?1)
               AND NOT EXISTS (SELECT 1 FROM fine f WHERE f.record_id = br.record_id)
             ORDER BY br.borrow_date ASC, br.record_id ASC
            "#,
            Self::COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![threshold.to_string()], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    const COLUMNS: &'static str = "record_id, member_id, book_id, borrow_date, return_date";

    /// 映射数据库行到 BorrowRecord 对象
    ///
    /// borrow_date 是逾期规则输入，解析失败按转换错误上抛（不做静默兜底）
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<BorrowRecord> {
        Ok(BorrowRecord {
            record_id: row.get(0)?,
            member_id: row.get(1)?,
            book_id: row.get(2)?,
            borrow_date: row
                .get::<_, String>(3)?
                .parse::<DateTime<Utc>>()
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            return_date: row
                .get::<_, Option<String>>(4)?
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        })
    }
}
