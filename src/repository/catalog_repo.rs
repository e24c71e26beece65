// ==========================================
// 图书馆流通管理系统 - 馆藏数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

mod author;
mod book;
mod category;

pub use author::AuthorRepository;
pub use book::BookRepository;
pub use category::CategoryRepository;
