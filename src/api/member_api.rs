// ==========================================
// 图书馆流通管理系统 - 读者 API
// ==========================================
// 职责: 读者注册、查询与联系方式维护
// 红线: 姓名与注册时间注册后不可变更
// ==========================================

use std::sync::Arc;

use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::member::Member;
use crate::repository::member_repo::MemberRepository;

// ==========================================
// MemberApi - 读者 API
// ==========================================

/// 读者API
///
/// 职责：
/// 1. 读者注册（邮箱唯一）
/// 2. 读者查询（按ID/邮箱/全量）
/// 3. 联系方式维护与注销
pub struct MemberApi {
    member_repo: Arc<MemberRepository>,
}

impl MemberApi {
    /// 创建新的MemberApi实例
    ///
    /// # 参数
    /// - member_repo: 读者仓储
    pub fn new(member_repo: Arc<MemberRepository>) -> Self {
        Self { member_repo }
    }

    /// 注册读者
    ///
    /// # 参数
    /// - full_name: 姓名
    /// - email: 邮箱（全馆唯一）
    /// - phone: 电话（可选）
    ///
    /// # 返回
    /// - Ok(Member): 新注册的读者
    /// - Err(ApiError::BusinessRuleViolation): 邮箱已被占用
    pub fn register_member(
        &self,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
    ) -> ApiResult<Member> {
        let _perf = crate::perf::PerfGuard::new("api.register_member");

        // 参数验证
        if full_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("读者姓名不能为空".to_string()));
        }
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::InvalidInput("邮箱不能为空".to_string()));
        }
        if !email.contains('@') {
            return Err(ApiError::InvalidInput(format!("邮箱格式无效: {}", email)));
        }

        let mut member = Member::new(full_name.trim(), email);
        member.phone = phone.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        self.member_repo.insert(&member)?;
        debug!(member_id = %member.member_id, "读者注册");
        Ok(member)
    }

    /// 按ID查询读者
    pub fn get_member(&self, member_id: &str) -> ApiResult<Member> {
        self.member_repo
            .find_by_id(member_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Member(id={})不存在", member_id)))
    }

    /// 按邮箱查询读者（不存在时返回 None，供注册查重使用）
    pub fn find_member_by_email(&self, email: &str) -> ApiResult<Option<Member>> {
        if email.trim().is_empty() {
            return Err(ApiError::InvalidInput("邮箱不能为空".to_string()));
        }
        Ok(self.member_repo.find_by_email(email.trim())?)
    }

    /// 列出全部读者
    pub fn list_members(&self) -> ApiResult<Vec<Member>> {
        Ok(self.member_repo.list_all()?)
    }

    /// 更新联系方式（邮箱必填，电话 None 表示清除）
    pub fn update_contact(
        &self,
        member_id: &str,
        email: &str,
        phone: Option<&str>,
    ) -> ApiResult<Member> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::InvalidInput("邮箱不能为空".to_string()));
        }
        if !email.contains('@') {
            return Err(ApiError::InvalidInput(format!("邮箱格式无效: {}", email)));
        }

        self.member_repo.update_contact(member_id, email, phone)?;
        self.get_member(member_id)
    }

    /// 注销读者（其借阅记录/罚款/预约级联清除）
    pub fn delete_member(&self, member_id: &str) -> ApiResult<()> {
        let _perf = crate::perf::PerfGuard::new("api.delete_member");
        self.member_repo.delete(member_id)?;
        debug!(member_id = %member_id, "读者注销");
        Ok(())
    }
}
