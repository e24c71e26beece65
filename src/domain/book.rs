// ==========================================
// 图书馆流通管理系统 - 馆藏领域模型
// ==========================================
// 职责: 图书/作者/分类实体与可借册数约束
// 红线: copies_available 任何时刻不得为负
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Book - 图书
// ==========================================
// copies_available 为"派生但落库"的计数器:
// 恒等于 (馆藏总册数 - 当前借出未还册数)，由流通引擎同步维护
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub book_id: String,             // 图书ID (UUID)
    pub title: String,               // 书名
    pub category_id: Option<String>, // 分类ID (分类删除后置空)
    pub isbn: String,                // ISBN (唯一)
    pub published_year: Option<i32>, // 出版年份
    pub copies_available: i64,       // 当前可借册数 (>= 0)
    pub created_at: DateTime<Utc>,   // 记录创建时间
    pub updated_at: DateTime<Utc>,   // 记录更新时间
}

impl Book {
    /// 新建图书（入库时可借册数 = 馆藏册数）
    pub fn new(title: &str, isbn: &str, copies: i64) -> Self {
        let now = Utc::now();
        Self {
            book_id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            category_id: None,
            isbn: isbn.to_string(),
            published_year: None,
            copies_available: copies.max(0),
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// Author - 作者
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub author_id: String,   // 作者ID (UUID)
    pub name: String,        // 姓名
    pub bio: Option<String>, // 简介
}

impl Author {
    pub fn new(name: &str, bio: Option<&str>) -> Self {
        Self {
            author_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            bio: bio.map(|s| s.to_string()),
        }
    }
}

// ==========================================
// Category - 分类
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String, // 分类ID (UUID)
    pub name: String,        // 分类名 (唯一)
}

impl Category {
    pub fn new(name: &str) -> Self {
        Self {
            category_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        }
    }
}

// ==========================================
// BookAuthor - 图书↔作者关联
// ==========================================
// 复合主键 (book_id, author_id)，任一侧删除时级联清除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAuthor {
    pub book_id: String,   // 图书ID
    pub author_id: String, // 作者ID
}

// ==========================================
// Trait: CopyInventory
// ==========================================
// 用途: 流通引擎的可借性判断接口
pub trait CopyInventory {
    /// 检查当前是否可借出一册
    fn can_borrow(&self) -> bool;

    /// 检查可借册数是否已耗尽
    fn is_exhausted(&self) -> bool;

    /// 计算归还一册后的可借册数
    fn copies_after_return(&self) -> i64;
}

// ==========================================
// CopyInventory trait 实现
// ==========================================
impl CopyInventory for Book {
    /// 检查当前是否可借出一册
    ///
    /// # 返回
    /// - `true`: copies_available > 0，可借
    /// - `false`: 已无可借册数
    fn can_borrow(&self) -> bool {
        self.copies_available > 0
    }

    /// 检查可借册数是否已耗尽
    fn is_exhausted(&self) -> bool {
        self.copies_available <= 0
    }

    /// 计算归还一册后的可借册数
    fn copies_after_return(&self) -> i64 {
        self.copies_available + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_clamps_negative_copies() {
        let book = Book::new("测试图书", "978-0-00-000000-0", -3);
        assert_eq!(book.copies_available, 0, "入库册数不得为负");
        assert!(book.is_exhausted());
    }

    #[test]
    fn test_copy_inventory_boundaries() {
        let mut book = Book::new("边界测试", "978-0-00-000001-7", 1);
        assert!(book.can_borrow());

        book.copies_available = 0;
        assert!(!book.can_borrow());
        assert!(book.is_exhausted());
        assert_eq!(book.copies_after_return(), 1);
    }
}
