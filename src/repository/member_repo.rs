// ==========================================
// 图书馆流通管理系统 - 读者仓储
// ==========================================
// 职责: 管理 member 表
// 说明: 读者删除时级联清除其借阅记录/罚款/预约
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::member::Member;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct MemberRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MemberRepository {
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
            CREATE TABLE IF NOT EXISTS member (
              member_id TEXT PRIMARY KEY,
              full_name TEXT NOT NULL,
              email TEXT NOT NULL UNIQUE,
              phone TEXT,
              joined_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// 注册读者
    pub fn insert(&self, member: &Member) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO member (member_id, full_name, email, phone, joined_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                member.member_id,
                member.full_name,
                member.email,
                member.phone,
                member.joined_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询读者
    pub fn find_by_id(&self, member_id: &str) -> RepositoryResult<Option<Member>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT member_id, full_name, email, phone, joined_at FROM member WHERE member_id = ?1",
            params![member_id],
            Self::map_row,
        );

        match result {
            Ok(member) => Ok(Some(member)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按邮箱查询读者
    pub fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Member>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT member_id, full_name, email, phone, joined_at FROM member WHERE email = ?1",
            params![email],
            Self::map_row,
        );

        match result {
            Ok(member) => Ok(Some(member)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 读者是否存在（引擎借阅前校验用，避免整行查询）
    pub fn exists(&self, member_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT 1 FROM member WHERE member_id = ?1 LIMIT 1",
            params![member_id],
            |_row| Ok(true),
        );

        match result {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出全部读者（按注册时间排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Member>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT member_id, full_name, email, phone, joined_at FROM member ORDER BY joined_at ASC, member_id ASC",
        )?;

        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 更新联系方式（姓名/注册时间不可变更）
    pub fn update_contact(
        &self,
        member_id: &str,
        email: &str,
        phone: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE member SET email = ?2, phone = ?3 WHERE member_id = ?1",
            params![member_id, email, phone],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Member".to_string(),
                id: member_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除读者（级联清除借阅记录/罚款/预约）
    pub fn delete(&self, member_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected =
            conn.execute("DELETE FROM member WHERE member_id = ?1", params![member_id])?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Member".to_string(),
                id: member_id.to_string(),
            });
        }
        Ok(())
    }

    /// 映射数据库行到 Member 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Member> {
        Ok(Member {
            member_id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            joined_at: row
                .get::<_, String>(4)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }
}
