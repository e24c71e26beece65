// ==========================================
// 图书馆流通管理系统 - 馆藏导入 Repository 实现
// ==========================================
// 职责: 委托图书/作者/分类仓储完成导入落库
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::book::{Author, BookAuthor, Category};
use crate::repository::catalog_repo::{AuthorRepository, BookRepository, CategoryRepository};
use crate::repository::error::RepositoryError;
use crate::repository::import_repo::CatalogImportRepository;
use async_trait::async_trait;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// CatalogImportRepositoryImpl
// ==========================================
pub struct CatalogImportRepositoryImpl {
    book_repo: Arc<BookRepository>,
    author_repo: Arc<AuthorRepository>,
    category_repo: Arc<CategoryRepository>,
}

impl CatalogImportRepositoryImpl {
    /// 创建新的 Repository 实例（三个仓储共享同一连接）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        let conn = Arc::new(Mutex::new(conn));

        Ok(Self {
            book_repo: Arc::new(BookRepository::from_connection(conn.clone())?),
            author_repo: Arc::new(AuthorRepository::from_connection(conn.clone())?),
            category_repo: Arc::new(CategoryRepository::from_connection(conn)?),
        })
    }

    /// 共享连接构造（测试用）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            book_repo: Arc::new(BookRepository::from_connection(conn.clone())?),
            author_repo: Arc::new(AuthorRepository::from_connection(conn.clone())?),
            category_repo: Arc::new(CategoryRepository::from_connection(conn)?),
        })
    }
}

#[async_trait]
impl CatalogImportRepository for CatalogImportRepositoryImpl {
    async fn batch_check_isbn_exists(
        &self,
        isbns: Vec<String>,
    ) -> Result<Vec<String>, Box<dyn Error>> {
        let mut existing = Vec::new();
        for isbn in isbns {
            if self.book_repo.find_by_isbn(&isbn)?.is_some() {
                existing.push(isbn);
            }
        }
        Ok(existing)
    }

    async fn insert_book(&self, book: crate::domain::book::Book) -> Result<(), Box<dyn Error>> {
        self.book_repo.insert(&book)?;
        Ok(())
    }

    async fn find_or_create_author(&self, name: &str) -> Result<Author, Box<dyn Error>> {
        if let Some(author) = self.author_repo.find_by_name(name)? {
            return Ok(author);
        }

        let author = Author::new(name, None);
        self.author_repo.insert(&author)?;
        Ok(author)
    }

    async fn find_or_create_category(&self, name: &str) -> Result<Category, Box<dyn Error>> {
        if let Some(category) = self.category_repo.find_by_name(name)? {
            return Ok(category);
        }

        let category = Category::new(name);
        match self.category_repo.insert(&category) {
            Ok(()) => Ok(category),
            // 分类名唯一，并发写入时落败方复用已有行
            Err(RepositoryError::UniqueConstraintViolation(_)) => self
                .category_repo
                .find_by_name(name)?
                .ok_or_else(|| format!("分类创建竞争后仍未找到: {}", name).into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn link_book_author(
        &self,
        book_id: &str,
        author_id: &str,
    ) -> Result<(), Box<dyn Error>> {
        self.author_repo.link_book(&BookAuthor {
            book_id: book_id.to_string(),
            author_id: author_id.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_impl() -> CatalogImportRepositoryImpl {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        CatalogImportRepositoryImpl::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_find_or_create_author_reuses_case_insensitive() {
        let repo = new_impl();

        let first = repo.find_or_create_author("Jane Austen").await.unwrap();
        let second = repo.find_or_create_author("JANE AUSTEN").await.unwrap();

        assert_eq!(first.author_id, second.author_id, "同名作者应复用（忽略大小写）");
        assert_eq!(first.name, "Jane Austen", "保留首次出现的写法");
    }

    #[tokio::test]
    async fn test_batch_check_isbn_exists() {
        let repo = new_impl();

        repo.insert_book(crate::domain::book::Book::new(
            "已有图书",
            "978-7-111-12345-6",
            1,
        ))
        .await
        .unwrap();

        let existing = repo
            .batch_check_isbn_exists(vec![
                "978-7-111-12345-6".to_string(),
                "978-7-111-99999-9".to_string(),
            ])
            .await
            .unwrap();

        assert_eq!(existing, vec!["978-7-111-12345-6".to_string()]);
    }
}
