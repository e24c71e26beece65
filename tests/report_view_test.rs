// ==========================================
// 报表视图集成测试
// ==========================================
// 测试范围:
// 1. 在借视图（排序与字段联查）
// 2. 逾期视图（阈值过滤与 days_overdue 口径）
// 3. 读者罚款汇总（内连接口径与缴清后的消失）
// ==========================================

mod helpers;

use helpers::api_test_helper::ApiTestEnv;
use library_circulation::config::config_keys;

#[test]
fn test_views_on_empty_database() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    assert!(env
        .report_api
        .list_active_borrows()
        .expect("在借视图查询失败")
        .is_empty());
    assert!(env
        .report_api
        .list_overdue_books()
        .expect("逾期视图查询失败")
        .is_empty());
    assert!(env
        .report_api
        .list_member_fine_summaries()
        .expect("罚款汇总查询失败")
        .is_empty());
}

#[test]
fn test_active_and_overdue_views() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let m1 = env.seed_member("张三", "zhangsan@example.com");
    let m2 = env.seed_member("李四", "lisi@example.com");
    let m3 = env.seed_member("王五", "wangwu@example.com");
    let b1 = env.seed_book("围城", "978-7-02-009000-2", 1);
    let b2 = env.seed_book("三体", "978-7-5366-9293-0", 1);
    let b3 = env.seed_book("万历十五年", "978-7-101-05203-1", 1);

    let overdue = env.seed_backdated_borrow(&m1.member_id, &b1.book_id, 20);
    let fresh = env.seed_backdated_borrow(&m2.member_id, &b2.book_id, 5);

    // 已归还的记录不进入任何视图
    let returned = env.seed_backdated_borrow(&m3.member_id, &b3.book_id, 2);
    env.circulation_api
        .return_book(&returned.record_id)
        .expect("归还失败");

    // 在借视图: 两条，按借出时间升序
    let active = env
        .report_api
        .list_active_borrows()
        .expect("在借视图查询失败");
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].record_id, overdue.record_id, "最早借出的排在最前");
    assert_eq!(active[0].member_name, "张三");
    assert_eq!(active[0].book_title, "围城");
    assert_eq!(active[1].record_id, fresh.record_id);

    // 逾期视图: 仅超过默认借期(14天)的那条
    let overdue_rows = env
        .report_api
        .list_overdue_books()
        .expect("逾期视图查询失败");
    assert_eq!(overdue_rows.len(), 1);
    assert_eq!(overdue_rows[0].record_id, overdue.record_id);
    assert_eq!(overdue_rows[0].member_name, "张三");
    assert_eq!(overdue_rows[0].book_title, "围城");
    assert_eq!(
        overdue_rows[0].days_overdue, 20,
        "days_overdue 为借出至今整天数"
    );
}

#[test]
fn test_overdue_view_follows_loan_period_config() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let member = env.seed_member("张三", "zhangsan@example.com");
    let book = env.seed_book("算法导论", "978-7-111-40701-0", 1);
    env.seed_backdated_borrow(&member.member_id, &book.book_id, 10);

    // 默认借期14天: 10天不逾期
    assert!(env
        .report_api
        .list_overdue_books()
        .expect("逾期视图查询失败")
        .is_empty());

    // 借期缩短到7天: 同一记录立即出现在逾期视图
    env.config_api
        .update_config(config_keys::LOAN_PERIOD_DAYS, "7")
        .expect("配置更新失败");
    let rows = env
        .report_api
        .list_overdue_books()
        .expect("逾期视图查询失败");
    assert_eq!(rows.len(), 1, "视图查询应使用当前配置的借期");
}

#[test]
fn test_fine_summary_aggregation_and_settlement() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let m1 = env.seed_member("张三", "zhangsan@example.com");
    let m2 = env.seed_member("李四", "lisi@example.com");
    let m3 = env.seed_member("王五", "wangwu@example.com");
    let b1 = env.seed_book("围城", "978-7-02-009000-2", 1);
    let b2 = env.seed_book("三体", "978-7-5366-9293-0", 1);
    let b3 = env.seed_book("万历十五年", "978-7-101-05203-1", 1);

    // 张三两条逾期，李四一条逾期，王五无逾期
    env.seed_backdated_borrow(&m1.member_id, &b1.book_id, 20);
    env.seed_backdated_borrow(&m1.member_id, &b2.book_id, 25);
    env.seed_backdated_borrow(&m2.member_id, &b3.book_id, 18);

    let sweep = env.circulation_api.sweep_overdue().expect("巡检失败");
    assert_eq!(sweep.issued, 3);

    let summaries = env
        .report_api
        .list_member_fine_summaries()
        .expect("罚款汇总查询失败");
    assert_eq!(summaries.len(), 2, "无未缴罚款的读者不出现");
    // 按未缴总额降序
    assert_eq!(summaries[0].member_id, m1.member_id);
    assert_eq!(summaries[0].unpaid_count, 2);
    assert_eq!(summaries[0].unpaid_total, 10.0);
    assert_eq!(summaries[1].member_id, m2.member_id);
    assert_eq!(summaries[1].unpaid_count, 1);
    assert_eq!(summaries[1].unpaid_total, 5.0);
    assert!(
        !summaries.iter().any(|s| s.member_id == m3.member_id),
        "无罚款的读者不应出现"
    );

    // 张三缴清一笔: 汇总随之减少
    let fines = env.fine_repo.list_by_member(&m1.member_id).expect("查询失败");
    env.fine_repo.mark_paid(&fines[0].fine_id).expect("缴费失败");

    let summaries = env
        .report_api
        .list_member_fine_summaries()
        .expect("罚款汇总查询失败");
    let zhang = summaries
        .iter()
        .find(|s| s.member_id == m1.member_id)
        .expect("仍有未缴罚款的读者应出现");
    assert_eq!(zhang.unpaid_count, 1);
    assert_eq!(zhang.unpaid_total, 5.0);

    // 李四全部缴清: 从汇总中消失（而非显示为0）
    let fines = env.fine_repo.list_by_member(&m2.member_id).expect("查询失败");
    env.fine_repo.mark_paid(&fines[0].fine_id).expect("缴费失败");

    let summaries = env
        .report_api
        .list_member_fine_summaries()
        .expect("罚款汇总查询失败");
    assert!(
        !summaries.iter().any(|s| s.member_id == m2.member_id),
        "罚款全部缴清的读者不应出现在汇总中"
    );
}
