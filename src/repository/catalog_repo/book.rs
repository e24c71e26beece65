// ==========================================
// 图书馆流通管理系统 - 图书仓储
// ==========================================
// 职责: 管理 book 表
// 红线: copies_available 的借还增减只经由流通仓储的原子操作，
//       本仓储的 update 不触碰该计数器
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::book::Book;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct BookRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BookRepository {
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
            CREATE TABLE IF NOT EXISTS book (
              book_id TEXT PRIMARY KEY,
              title TEXT NOT NULL,
              category_id TEXT REFERENCES category(category_id) ON DELETE SET NULL,
              isbn TEXT NOT NULL UNIQUE,
              published_year INTEGER,
              copies_available INTEGER NOT NULL DEFAULT 0 CHECK (copies_available >= 0),
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_book_category
              ON book(category_id);
            "#,
        )?;
        Ok(())
    }

    /// 新增图书
    ///
    /// # 参数
    /// - `book`: 图书对象（入库册数即初始可借册数）
    pub fn insert(&self, book: &Book) -> RepositoryResult<()> {
        if book.copies_available < 0 {
            return Err(RepositoryError::ValidationError(format!(
                "可借册数不得为负: {}",
                book.copies_available
            )));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO book (
                book_id, title, category_id, isbn,
                published_year, copies_available, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                book.book_id,
                book.title,
                book.category_id,
                book.isbn,
                book.published_year,
                book.copies_available,
                book.created_at.to_rfc3339(),
                book.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询图书
    pub fn find_by_id(&self, book_id: &str) -> RepositoryResult<Option<Book>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM book WHERE book_id = ?1",
            Self::COLUMNS
        ))?;

        let result = stmt.query_row(params![book_id], Self::map_row);
        match result {
            Ok(book) => Ok(Some(book)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 ISBN 查询图书
    pub fn find_by_isbn(&self, isbn: &str) -> RepositoryResult<Option<Book>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM book WHERE isbn = ?1",
            Self::COLUMNS
        ))?;

        let result = stmt.query_row(params![isbn], Self::map_row);
        match result {
            Ok(book) => Ok(Some(book)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出全部图书（按书名排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Book>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM book ORDER BY title ASC, book_id ASC",
            Self::COLUMNS
        ))?;

        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 按书名模糊检索
    pub fn search_by_title(&self, keyword: &str) -> RepositoryResult<Vec<Book>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM book WHERE title LIKE ?1 ORDER BY title ASC, book_id ASC",
            Self::COLUMNS
        ))?;

        let pattern = format!("%{}%", keyword);
        let rows = stmt
            .query_map(params![pattern], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 更新图书基础信息（不含 copies_available）
    pub fn update(&self, book: &Book) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            r#"
            UPDATE book SET
                title = ?2,
                category_id = ?3,
                isbn = ?4,
                published_year = ?5,
                updated_at = ?6
            WHERE book_id = ?1
            "#,
            params![
                book.book_id,
                book.title,
                book.category_id,
                book.isbn,
                book.published_year,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Book".to_string(),
                id: book.book_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除图书（级联清除关联/借阅/预约，罚款保留置空）
    pub fn delete(&self, book_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute("DELETE FROM book WHERE book_id = ?1", params![book_id])?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Book".to_string(),
                id: book_id.to_string(),
            });
        }
        Ok(())
    }

    const COLUMNS: &'static str =
        "book_id, title, category_id, isbn, published_year, copies_available, created_at, updated_at";

    /// 映射数据库行到 Book 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Book> {
        Ok(Book {
            book_id: row.get(0)?,
            title: row.get(1)?,
            category_id: row.get(2)?,
            isbn: row.get(3)?,
            published_year: row.get(4)?,
            copies_available: row.get(5)?,
            created_at: row
                .get::<_, String>(6)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| chrono::Utc::now()),
            updated_at: row
                .get::<_, String>(7)?
                .parse::<chrono::DateTime<chrono::Utc>>()
                .unwrap_or_else(|_| chrono::Utc::now()),
        })
    }
}
