// ==========================================
// 图书馆流通管理系统 - 馆藏导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::book::{Author, Book, Category};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// CatalogImportRepository Trait
// ==========================================
// 用途: 馆藏批量导入相关数据访问
// 实现者: CatalogImportRepositoryImpl（委托 rusqlite 仓储）
#[async_trait]
pub trait CatalogImportRepository: Send + Sync {
    /// 批量检查 ISBN 是否已存在馆藏
    ///
    /// # 参数
    /// - isbns: ISBN 列表
    ///
    /// # 返回
    /// - Ok(Vec<String>): 其中已存在于馆藏的 ISBN
    async fn batch_check_isbn_exists(
        &self,
        isbns: Vec<String>,
    ) -> Result<Vec<String>, Box<dyn Error>>;

    /// 入库一册图书
    ///
    /// # 参数
    /// - book: 图书对象（含分类引用与初始可借册数）
    async fn insert_book(&self, book: Book) -> Result<(), Box<dyn Error>>;

    /// 按姓名查找作者（忽略大小写），不存在则创建
    ///
    /// # 返回
    /// - Ok(Author): 已有或新建的作者
    async fn find_or_create_author(&self, name: &str) -> Result<Author, Box<dyn Error>>;

    /// 按名称查找分类（忽略大小写），不存在则创建
    ///
    /// # 返回
    /// - Ok(Category): 已有或新建的分类
    async fn find_or_create_category(&self, name: &str) -> Result<Category, Box<dyn Error>>;

    /// 建立图书↔作者关联（重复关联幂等）
    async fn link_book_author(
        &self,
        book_id: &str,
        author_id: &str,
    ) -> Result<(), Box<dyn Error>>;
}
