// ==========================================
// 图书馆流通管理系统 - 预约仓储
// ==========================================
// 职责: 管理 reservation 表
// 说明: 预约仅记录存在性，无履约/取消状态机
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::circulation::Reservation;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct ReservationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationRepository {
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
            CREATE TABLE IF NOT EXISTS reservation (
              reservation_id TEXT PRIMARY KEY,
              member_id TEXT NOT NULL REFERENCES member(member_id) ON DELETE CASCADE,
              book_id TEXT NOT NULL REFERENCES book(book_id) ON DELETE CASCADE,
              reservation_date TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reservation_member
              ON reservation(member_id);
            "#,
        )?;
        Ok(())
    }

    /// 写入预约
    pub fn insert(&self, reservation: &Reservation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO reservation (reservation_id, member_id, book_id, reservation_date)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                reservation.reservation_id,
                reservation.member_id,
                reservation.book_id,
                reservation.reservation_date.to_string(),
            ],
        )?;
        Ok(())
    }

    /// 查询某读者的全部预约（按预约日期排序）
    pub fn list_by_member(&self, member_id: &str) -> RepositoryResult<Vec<Reservation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT reservation_id, member_id, book_id, reservation_date
              FROM reservation
             WHERE member_id = ?1
             ORDER BY reservation_date ASC, reservation_id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![member_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 映射数据库行到 Reservation 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Reservation> {
        Ok(Reservation {
            reservation_id: row.get(0)?,
            member_id: row.get(1)?,
            book_id: row.get(2)?,
            reservation_date: row
                .get::<_, String>(3)?
                .parse::<NaiveDate>()
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
        })
    }
}
