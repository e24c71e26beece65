// ==========================================
// 图书馆流通管理系统 - 分类仓储
// ==========================================
// 职责: 管理 category 表
// 说明: 分类删除时，book.category_id 置空（不删书）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::book::Category;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct CategoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CategoryRepository {
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
            CREATE TABLE IF NOT EXISTS category (
              category_id TEXT PRIMARY KEY,
              name TEXT NOT NULL UNIQUE
            );
            "#,
        )?;
        Ok(())
    }

    /// 新增分类
    pub fn insert(&self, category: &Category) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO category (category_id, name) VALUES (?1, ?2)",
            params![category.category_id, category.name],
        )?;
        Ok(())
    }

    /// 按ID查询分类
    pub fn find_by_id(&self, category_id: &str) -> RepositoryResult<Option<Category>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT category_id, name FROM category WHERE category_id = ?1",
            params![category_id],
            Self::map_row,
        );

        match result {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按名称精确查询（导入去重用，忽略大小写）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Category>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT category_id, name FROM category WHERE name = ?1 COLLATE NOCASE",
            params![name],
            Self::map_row,
        );

        match result {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列出全部分类（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Category>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT category_id, name FROM category ORDER BY name ASC")?;

        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 删除分类（依赖图书的 category_id 置空）
    pub fn delete(&self, category_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "DELETE FROM category WHERE category_id = ?1",
            params![category_id],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Category".to_string(),
                id: category_id.to_string(),
            });
        }
        Ok(())
    }

    /// 映射数据库行到 Category 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Category> {
        Ok(Category {
            category_id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}
