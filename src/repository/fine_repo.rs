// ==========================================
// 图书馆流通管理系统 - 罚款台账仓储
// ==========================================
// 职责: 管理 fine 表（引擎视角只追加）
// 红线: record_id 唯一约束实现"每段逾期至多一罚"，
//       下发路径一律 INSERT OR IGNORE
// 说明: 读者删除级联清除罚款；图书删除仅置空 record_id，台账保留
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::fine::Fine;
use crate::domain::types::FineStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct FineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FineRepository {
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
            CREATE TABLE IF NOT EXISTS fine (
              fine_id TEXT PRIMARY KEY,
              member_id TEXT NOT NULL REFERENCES member(member_id) ON DELETE CASCADE,
              record_id TEXT UNIQUE REFERENCES borrow_record(record_id) ON DELETE SET NULL,
              amount REAL NOT NULL,
              issue_date TEXT NOT NULL,
              paid INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_fine_member
              ON fine(member_id, paid);
            "#,
        )?;
        Ok(())
    }

    /// 下发罚款（同一借阅记录已有罚款时静默跳过）
    ///
    /// # 返回
    /// - `true`: 本次写入了新罚款
    /// - `false`: 该记录已有罚款，未重复下发
    pub fn insert_if_absent(&self, fine: &Fine) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            r#"
            INSERT OR IGNORE INTO fine (fine_id, member_id, record_id, amount, issue_date, paid)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                fine.fine_id,
                fine.member_id,
                fine.record_id,
                fine.amount,
                fine.issue_date.to_string(),
                fine.status.to_db_flag(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// 某借阅记录是否已有罚款
    pub fn exists_for_record(&self, record_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM fine WHERE record_id = ?1 LIMIT 1",
                params![record_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    /// 按ID查询罚款
    pub fn find_by_id(&self, fine_id: &str) -> RepositoryResult<Option<Fine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM fine WHERE fine_id = ?1",
            Self::COLUMNS
        ))?;

        let result = stmt.query_row(params![fine_id], Self::map_row);
        match result {
            Ok(fine) => Ok(Some(fine)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某读者的全部罚款（按下发日期排序）
    pub fn list_by_member(&self, member_id: &str) -> RepositoryResult<Vec<Fine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM fine WHERE member_id = ?1 ORDER BY issue_date ASC, fine_id ASC",
            Self::COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![member_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询某读者的未缴罚款
    pub fn list_unpaid_by_member(&self, member_id: &str) -> RepositoryResult<Vec<Fine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM fine WHERE member_id = ?1 AND paid = 0 ORDER BY issue_date ASC, fine_id ASC",
            Self::COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![member_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 标记罚款已缴（外部收款方回写入口，状态单向流转）
    pub fn mark_paid(&self, fine_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE fine SET paid = 1 WHERE fine_id = ?1",
            params![fine_id],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Fine".to_string(),
                id: fine_id.to_string(),
            });
        }
        Ok(())
    }

    const COLUMNS: &'static str = "fine_id, member_id, record_id, amount, issue_date, paid";

    /// 映射数据库行到 Fine 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Fine> {
        Ok(Fine {
            fine_id: row.get(0)?,
            member_id: row.get(1)?,
            record_id: row.get(2)?,
            amount: row.get(3)?,
            issue_date: row
                .get::<_, String>(4)?
                .parse::<NaiveDate>()
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            status: FineStatus::from_db_flag(row.get(5)?),
        })
    }
}
