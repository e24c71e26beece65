// ==========================================
// 集成测试辅助模块
// ==========================================

pub mod api_test_helper;
