// ==========================================
// 图书馆流通管理系统 - 馆藏 API
// ==========================================
// 职责: 图书/作者/分类的增删改查与关联维护
// 红线: copies_available 只在入库时由本层设定，此后仅由流通引擎变更
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::book::{Author, Book, BookAuthor, Category};
use crate::repository::catalog_repo::{AuthorRepository, BookRepository, CategoryRepository};

// ==========================================
// CreateBookRequest - 图书入库请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub isbn: String,
    pub category_id: Option<String>,
    pub published_year: Option<i32>,
    /// 入库册数（即初始可借册数）
    pub copies: i64,
}

// ==========================================
// CatalogApi - 馆藏 API
// ==========================================

/// 馆藏API
///
/// 职责：
/// 1. 图书入库、查询、信息维护、下架
/// 2. 作者与分类的维护
/// 3. 图书↔作者关联维护
pub struct CatalogApi {
    book_repo: Arc<BookRepository>,
    author_repo: Arc<AuthorRepository>,
    category_repo: Arc<CategoryRepository>,
}

impl CatalogApi {
    /// 创建新的CatalogApi实例
    ///
    /// # 参数
    /// - book_repo: 图书仓储
    /// - author_repo: 作者仓储
    /// - category_repo: 分类仓储
    pub fn new(
        book_repo: Arc<BookRepository>,
        author_repo: Arc<AuthorRepository>,
        category_repo: Arc<CategoryRepository>,
    ) -> Self {
        Self {
            book_repo,
            author_repo,
            category_repo,
        }
    }

    // ==========================================
    // 图书接口
    // ==========================================

    /// 图书入库
    ///
    /// # 参数
    /// - req: 入库请求（书名/ISBN 必填，分类/出版年可选）
    ///
    /// # 返回
    /// - Ok(Book): 新入库的图书
    /// - Err(ApiError::BusinessRuleViolation): ISBN 已存在
    pub fn create_book(&self, req: CreateBookRequest) -> ApiResult<Book> {
        let _perf = crate::perf::PerfGuard::new("api.create_book");

        // 参数验证
        if req.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("书名不能为空".to_string()));
        }
        if req.isbn.trim().is_empty() {
            return Err(ApiError::InvalidInput("ISBN不能为空".to_string()));
        }
        if req.copies < 0 {
            return Err(ApiError::InvalidInput("入库册数不能为负".to_string()));
        }

        // 分类存在性校验
        if let Some(ref category_id) = req.category_id {
            self.category_repo
                .find_by_id(category_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Category(id={})不存在", category_id)))?;
        }

        let mut book = Book::new(req.title.trim(), req.isbn.trim(), req.copies);
        book.category_id = req.category_id;
        book.published_year = req.published_year;

        self.book_repo.insert(&book)?;
        debug!(book_id = %book.book_id, isbn = %book.isbn, "图书入库");
        Ok(book)
    }

    /// 查询单册图书
    pub fn get_book(&self, book_id: &str) -> ApiResult<Book> {
        self.book_repo
            .find_by_id(book_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Book(id={})不存在", book_id)))
    }

    /// 按 ISBN 查询图书（不存在时返回 None，供查重使用）
    pub fn find_book_by_isbn(&self, isbn: &str) -> ApiResult<Option<Book>> {
        if isbn.trim().is_empty() {
            return Err(ApiError::InvalidInput("ISBN不能为空".to_string()));
        }
        Ok(self.book_repo.find_by_isbn(isbn.trim())?)
    }

    /// 列出全部图书
    pub fn list_books(&self) -> ApiResult<Vec<Book>> {
        Ok(self.book_repo.list_all()?)
    }

    /// 按书名关键字检索
    pub fn search_books(&self, keyword: &str) -> ApiResult<Vec<Book>> {
        if keyword.trim().is_empty() {
            return Err(ApiError::InvalidInput("检索关键字不能为空".to_string()));
        }
        Ok(self.book_repo.search_by_title(keyword.trim())?)
    }

    /// 更新图书信息（整体替换书名/ISBN/出版年，不触碰可借册数）
    ///
    /// # 参数
    /// - book_id: 图书ID
    /// - title: 新书名
    /// - isbn: 新ISBN
    /// - published_year: 新出版年（None 表示清除）
    pub fn update_book_info(
        &self,
        book_id: &str,
        title: &str,
        isbn: &str,
        published_year: Option<i32>,
    ) -> ApiResult<Book> {
        let _perf = crate::perf::PerfGuard::new("api.update_book_info");

        if title.trim().is_empty() {
            return Err(ApiError::InvalidInput("书名不能为空".to_string()));
        }
        if isbn.trim().is_empty() {
            return Err(ApiError::InvalidInput("ISBN不能为空".to_string()));
        }

        let mut book = self.get_book(book_id)?;
        book.title = title.trim().to_string();
        book.isbn = isbn.trim().to_string();
        book.published_year = published_year;

        self.book_repo.update(&book)?;
        Ok(book)
    }

    /// 调整图书所属分类（None 表示移出分类）
    pub fn assign_category(&self, book_id: &str, category_id: Option<&str>) -> ApiResult<Book> {
        if let Some(category_id) = category_id {
            self.category_repo
                .find_by_id(category_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Category(id={})不存在", category_id)))?;
        }

        let mut book = self.get_book(book_id)?;
        book.category_id = category_id.map(|s| s.to_string());

        self.book_repo.update(&book)?;
        Ok(book)
    }

    /// 图书下架（借阅记录随之级联清除）
    pub fn delete_book(&self, book_id: &str) -> ApiResult<()> {
        let _perf = crate::perf::PerfGuard::new("api.delete_book");
        self.book_repo.delete(book_id)?;
        debug!(book_id = %book_id, "图书下架");
        Ok(())
    }

    // ==========================================
    // 作者接口
    // ==========================================

    /// 新建作者
    pub fn create_author(&self, name: &str, bio: Option<&str>) -> ApiResult<Author> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("作者姓名不能为空".to_string()));
        }

        let author = Author::new(name.trim(), bio);
        self.author_repo.insert(&author)?;
        Ok(author)
    }

    /// 查询单个作者
    pub fn get_author(&self, author_id: &str) -> ApiResult<Author> {
        self.author_repo
            .find_by_id(author_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Author(id={})不存在", author_id)))
    }

    /// 列出全部作者
    pub fn list_authors(&self) -> ApiResult<Vec<Author>> {
        Ok(self.author_repo.list_all()?)
    }

    /// 删除作者（图书↔作者关联级联清除，图书本身保留）
    pub fn delete_author(&self, author_id: &str) -> ApiResult<()> {
        self.author_repo.delete(author_id)?;
        Ok(())
    }

    // ==========================================
    // 图书↔作者关联接口
    // ==========================================

    /// 建立图书↔作者关联（幂等）
    pub fn link_author(&self, book_id: &str, author_id: &str) -> ApiResult<()> {
        // 两侧存在性校验，避免裸外键报错
        self.get_book(book_id)?;
        self.get_author(author_id)?;

        self.author_repo.link_book(&BookAuthor {
            book_id: book_id.to_string(),
            author_id: author_id.to_string(),
        })?;
        Ok(())
    }

    /// 解除图书↔作者关联
    pub fn unlink_author(&self, book_id: &str, author_id: &str) -> ApiResult<()> {
        Ok(self.author_repo.unlink_book(book_id, author_id)?)
    }

    /// 查询某图书的全部作者
    pub fn list_authors_of_book(&self, book_id: &str) -> ApiResult<Vec<Author>> {
        Ok(self.author_repo.list_by_book(book_id)?)
    }

    /// 查询某作者名下的全部图书
    pub fn list_books_of_author(&self, author_id: &str) -> ApiResult<Vec<Book>> {
        let book_ids = self.author_repo.list_book_ids_by_author(author_id)?;

        let mut books = Vec::with_capacity(book_ids.len());
        for book_id in book_ids {
            if let Some(book) = self.book_repo.find_by_id(&book_id)? {
                books.push(book);
            }
        }
        Ok(books)
    }

    // ==========================================
    // 分类接口
    // ==========================================

    /// 新建分类（分类名唯一）
    pub fn create_category(&self, name: &str) -> ApiResult<Category> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("分类名不能为空".to_string()));
        }

        let category = Category::new(name.trim());
        self.category_repo.insert(&category)?;
        Ok(category)
    }

    /// 查询单个分类
    pub fn get_category(&self, category_id: &str) -> ApiResult<Category> {
        self.category_repo
            .find_by_id(category_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Category(id={})不存在", category_id)))
    }

    /// 列出全部分类
    pub fn list_categories(&self) -> ApiResult<Vec<Category>> {
        Ok(self.category_repo.list_all()?)
    }

    /// 删除分类（名下图书的 category_id 置空，图书保留）
    pub fn delete_category(&self, category_id: &str) -> ApiResult<()> {
        self.category_repo.delete(category_id)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn new_api() -> CatalogApi {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        CatalogApi::new(
            Arc::new(BookRepository::from_connection(conn.clone()).unwrap()),
            Arc::new(AuthorRepository::from_connection(conn.clone()).unwrap()),
            Arc::new(CategoryRepository::from_connection(conn).unwrap()),
        )
    }

    fn book_req(title: &str, isbn: &str, copies: i64) -> CreateBookRequest {
        CreateBookRequest {
            title: title.to_string(),
            isbn: isbn.to_string(),
            category_id: None,
            published_year: None,
            copies,
        }
    }

    #[test]
    fn test_create_and_search_book() {
        let api = new_api();

        let book = api
            .create_book(book_req("Rust 程序设计语言", "978-7-121-34862-2", 3))
            .unwrap();
        assert_eq!(book.copies_available, 3);

        let hits = api.search_books("Rust").unwrap();
        assert_eq!(hits.len(), 1, "按书名关键字应命中一条");
        assert_eq!(hits[0].book_id, book.book_id);

        let by_isbn = api.find_book_by_isbn("978-7-121-34862-2").unwrap();
        assert!(by_isbn.is_some());
    }

    #[test]
    fn test_duplicate_isbn_rejected() {
        let api = new_api();

        api.create_book(book_req("第一册", "978-0-13-468599-1", 1))
            .unwrap();
        let result = api.create_book(book_req("第二册", "978-0-13-468599-1", 1));
        assert!(
            matches!(result, Err(ApiError::BusinessRuleViolation(_))),
            "重复 ISBN 应映射为业务规则违反"
        );
    }

    #[test]
    fn test_create_book_with_missing_category_rejected() {
        let api = new_api();

        let mut req = book_req("孤本", "978-0-00-000002-4", 1);
        req.category_id = Some("C-MISSING".to_string());
        assert!(matches!(
            api.create_book(req),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_author_link_and_listing() {
        let api = new_api();

        let book = api
            .create_book(book_req("代码大全", "978-7-121-02298-2", 2))
            .unwrap();
        let author = api.create_author("Steve McConnell", None).unwrap();

        api.link_author(&book.book_id, &author.author_id).unwrap();
        // 重复关联幂等
        api.link_author(&book.book_id, &author.author_id).unwrap();

        let authors = api.list_authors_of_book(&book.book_id).unwrap();
        assert_eq!(authors.len(), 1);

        let books = api.list_books_of_author(&author.author_id).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].book_id, book.book_id);
    }

    #[test]
    fn test_category_delete_clears_book_reference() {
        let api = new_api();

        let category = api.create_category("计算机").unwrap();
        let mut req = book_req("算法导论", "978-7-111-40701-0", 1);
        req.category_id = Some(category.category_id.clone());
        let book = api.create_book(req).unwrap();

        api.delete_category(&category.category_id).unwrap();

        let reloaded = api.get_book(&book.book_id).unwrap();
        assert!(reloaded.category_id.is_none(), "分类删除后图书引用应置空");
    }
}
