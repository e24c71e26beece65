// ==========================================
// 馆藏与读者数据完整性集成测试
// ==========================================
// 测试范围:
// 1. 唯一约束（ISBN/分类名/邮箱）到业务错误的映射
// 2. 外键行为: 删分类置空、删图书/读者级联、罚款挂空
// 3. 图书信息更新与检索
// ==========================================

mod helpers;

use helpers::api_test_helper::ApiTestEnv;
use library_circulation::api::{ApiError, CreateBookRequest};

#[test]
fn test_duplicate_isbn_rejected() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    env.seed_book("围城", "978-7-02-009000-2", 1);

    let err = env
        .catalog_api
        .create_book(CreateBookRequest {
            title: "围城(修订版)".to_string(),
            isbn: "978-7-02-009000-2".to_string(),
            category_id: None,
            published_year: Some(1991),
            copies: 2,
        })
        .expect_err("重复ISBN应被拒绝");
    assert!(
        matches!(err, ApiError::BusinessRuleViolation(_)),
        "实际错误: {:?}",
        err
    );

    // 首条入库不受影响
    let books = env.catalog_api.list_books().expect("查询失败");
    assert_eq!(books.len(), 1);
}

#[test]
fn test_duplicate_category_name_and_member_email_rejected() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    env.catalog_api.create_category("文学").expect("建分类失败");
    let err = env
        .catalog_api
        .create_category("文学")
        .expect_err("重复分类名应被拒绝");
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));

    env.seed_member("张三", "zhangsan@example.com");
    let err = env
        .member_api
        .register_member("李四", "zhangsan@example.com", None)
        .expect_err("重复邮箱应被拒绝");
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    assert_eq!(env.member_api.list_members().expect("查询失败").len(), 1);
}

#[test]
fn test_create_book_with_unknown_category_not_found() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");

    let err = env
        .catalog_api
        .create_book(CreateBookRequest {
            title: "三体".to_string(),
            isbn: "978-7-5366-9293-0".to_string(),
            category_id: Some("不存在的分类".to_string()),
            published_year: None,
            copies: 1,
        })
        .expect_err("未知分类应被拒绝");
    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(env.catalog_api.list_books().expect("查询失败").is_empty());
}

#[test]
fn test_delete_category_detaches_books() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let category = env.catalog_api.create_category("计算机").expect("建分类失败");
    let book = env
        .catalog_api
        .create_book(CreateBookRequest {
            title: "算法导论".to_string(),
            isbn: "978-7-111-40701-0".to_string(),
            category_id: Some(category.category_id.clone()),
            published_year: Some(2012),
            copies: 1,
        })
        .expect("图书入库失败");
    assert_eq!(book.category_id.as_deref(), Some(category.category_id.as_str()));
    let fetched = env
        .catalog_api
        .get_category(&category.category_id)
        .expect("查分类失败");
    assert_eq!(fetched.name, "计算机");

    env.catalog_api
        .delete_category(&category.category_id)
        .expect("删分类失败");
    assert!(matches!(
        env.catalog_api.get_category(&category.category_id),
        Err(ApiError::NotFound(_))
    ));

    // 分类删除后图书保留，归属置空
    let book = env.catalog_api.get_book(&book.book_id).expect("查询失败");
    assert!(book.category_id.is_none(), "删分类应置空图书归属而非删书");
}

#[test]
fn test_delete_book_cascades_records_and_keeps_fine() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let member = env.seed_member("张三", "zhangsan@example.com");
    let book = env.seed_book("围城", "978-7-02-009000-2", 1);
    let author = env
        .catalog_api
        .create_author("钱锺书", None)
        .expect("建作者失败");
    env.catalog_api
        .link_author(&book.book_id, &author.author_id)
        .expect("关联作者失败");

    let record = env.seed_backdated_borrow(&member.member_id, &book.book_id, 20);
    let sweep = env.circulation_api.sweep_overdue().expect("巡检失败");
    assert_eq!(sweep.issued, 1);

    env.catalog_api.delete_book(&book.book_id).expect("下架失败");

    // 借阅记录与作者关联级联清除
    assert!(env
        .borrow_repo
        .find_by_id(&record.record_id)
        .expect("查询失败")
        .is_none());
    assert!(env
        .author_repo
        .list_by_book(&book.book_id)
        .expect("查询失败")
        .is_empty());
    // 作者本身保留
    assert!(env
        .catalog_api
        .get_author(&author.author_id)
        .is_ok());

    // 罚款保留，记录指针挂空
    let fines = env
        .fine_repo
        .list_by_member(&member.member_id)
        .expect("查询失败");
    assert_eq!(fines.len(), 1, "图书下架不应抹除既有罚款");
    assert!(fines[0].record_id.is_none(), "罚款的记录指针应置空");
}

#[test]
fn test_delete_member_cascades_records_and_fines() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let member = env.seed_member("张三", "zhangsan@example.com");
    let book = env.seed_book("三体", "978-7-5366-9293-0", 1);

    let record = env.seed_backdated_borrow(&member.member_id, &book.book_id, 20);
    env.circulation_api.sweep_overdue().expect("巡检失败");

    env.member_api
        .delete_member(&member.member_id)
        .expect("注销失败");

    assert!(matches!(
        env.member_api.get_member(&member.member_id),
        Err(ApiError::NotFound(_))
    ));
    assert!(env
        .borrow_repo
        .find_by_id(&record.record_id)
        .expect("查询失败")
        .is_none());
    assert!(env
        .fine_repo
        .list_by_member(&member.member_id)
        .expect("查询失败")
        .is_empty());
    // 图书本身不受影响
    assert!(env.catalog_api.get_book(&book.book_id).is_ok());
}

#[test]
fn test_delete_author_removes_link_only() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let book = env.seed_book("三体", "978-7-5366-9293-0", 1);
    let author = env
        .catalog_api
        .create_author("刘慈欣", Some("科幻作家"))
        .expect("建作者失败");
    env.catalog_api
        .link_author(&book.book_id, &author.author_id)
        .expect("关联作者失败");
    assert_eq!(
        env.catalog_api
            .list_authors_of_book(&book.book_id)
            .expect("查询失败")
            .len(),
        1
    );

    env.catalog_api
        .delete_author(&author.author_id)
        .expect("删作者失败");

    assert!(env
        .catalog_api
        .list_authors_of_book(&book.book_id)
        .expect("查询失败")
        .is_empty());
    assert!(env.catalog_api.get_book(&book.book_id).is_ok());
}

#[test]
fn test_update_book_info_and_search() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let book = env.seed_book("围城", "978-7-02-009000-2", 3);

    let updated = env
        .catalog_api
        .update_book_info(&book.book_id, "围城(纪念版)", "978-7-02-015001-0", Some(2023))
        .expect("更新失败");
    assert_eq!(updated.title, "围城(纪念版)");
    assert_eq!(updated.isbn, "978-7-02-015001-0");
    assert_eq!(updated.published_year, Some(2023));
    // 可借册数不受信息更新影响
    assert_eq!(updated.copies_available, 3);

    let hits = env.catalog_api.search_books("纪念版").expect("检索失败");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].book_id, book.book_id);

    assert!(env
        .catalog_api
        .search_books("不存在的关键字")
        .expect("检索失败")
        .is_empty());
}
