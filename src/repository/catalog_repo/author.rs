// ==========================================
// 图书馆流通管理系统 - 作者仓储
// ==========================================
// 职责: 管理 author 表与 book_author 关联表
// 说明: 关联为复合主键 (book_id, author_id)，两侧删除均级联
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::book::{Author, BookAuthor};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct AuthorRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuthorRepository {
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
            CREATE TABLE IF NOT EXISTS author (
              author_id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              bio TEXT
            );

            CREATE TABLE IF NOT EXISTS book_author (
              book_id TEXT NOT NULL REFERENCES book(book_id) ON DELETE CASCADE,
              author_id TEXT NOT NULL REFERENCES author(author_id) ON DELETE CASCADE,
              PRIMARY KEY (book_id, author_id)
            );

            CREATE INDEX IF NOT EXISTS idx_book_author_author
              ON book_author(author_id);
            "#,
        )?;
        Ok(())
    }

    /// 新增作者
    pub fn insert(&self, author: &Author) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO author (author_id, name, bio) VALUES (?1, ?2, ?3)",
            params![author.author_id, author.name, author.bio],
        )?;
        Ok(())
    }

    /// 按ID查询作者
    pub fn find_by_id(&self, author_id: &str) -> RepositoryResult<Option<Author>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT author_id, name, bio FROM author WHERE author_id = ?1",
            params![author_id],
            Self::map_row,
        );

        match result {
            Ok(author) => Ok(Some(author)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按姓名精确查询（导入去重用，忽略大小写）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Author>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT author_id, name, bio FROM author WHERE name = ?1 COLLATE NOCASE",
            params![name],
            Self::map_row,
        );

        match result {
            Ok(author) => Ok(Some(author)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出全部作者（按姓名排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Author>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT author_id, name, bio FROM author ORDER BY name ASC")?;

        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 删除作者（级联清除 book_author 关联）
    pub fn delete(&self, author_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected =
            conn.execute("DELETE FROM author WHERE author_id = ?1", params![author_id])?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Author".to_string(),
                id: author_id.to_string(),
            });
        }
        Ok(())
    }

    // ===== book_author 关联 =====

    /// 建立图书↔作者关联（重复关联视为幂等）
    pub fn link_book(&self, link: &BookAuthor) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO book_author (book_id, author_id) VALUES (?1, ?2)",
            params![link.book_id, link.author_id],
        )?;
        Ok(())
    }

    /// 解除图书↔作者关联
    pub fn unlink_book(&self, book_id: &str, author_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM book_author WHERE book_id = ?1 AND author_id = ?2",
            params![book_id, author_id],
        )?;
        Ok(())
    }

    /// 查询某图书的全部作者
    pub fn list_by_book(&self, book_id: &str) -> RepositoryResult<Vec<Author>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.author_id, a.name, a.bio
            FROM author a
            JOIN book_author ba ON ba.author_id = a.author_id
            WHERE ba.book_id = ?1
            ORDER BY a.name ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![book_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询某作者名下的全部图书ID
    pub fn list_book_ids_by_author(&self, author_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT book_id FROM book_author WHERE author_id = ?1 ORDER BY book_id ASC",
        )?;

        let rows = stmt
            .query_map(params![author_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 映射数据库行到 Author 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Author> {
        Ok(Author {
            author_id: row.get(0)?,
            name: row.get(1)?,
            bio: row.get(2)?,
        })
    }
}
