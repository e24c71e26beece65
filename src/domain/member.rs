// ==========================================
// 图书馆流通管理系统 - 读者领域模型
// ==========================================
// 职责: 读者(会员)实体
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Member - 读者
// ==========================================
// 注册后除联系方式外不可变更；正常运营不做硬删除
// (一旦删除，级联清除其借阅记录/罚款/预约)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub member_id: String,         // 读者ID (UUID)
    pub full_name: String,         // 姓名
    pub email: String,             // 邮箱 (唯一)
    pub phone: Option<String>,     // 电话
    pub joined_at: DateTime<Utc>,  // 注册时间
}

impl Member {
    /// 新建读者
    pub fn new(full_name: &str, email: &str) -> Self {
        Self {
            member_id: uuid::Uuid::new_v4().to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            phone: None,
            joined_at: Utc::now(),
        }
    }
}
