use chrono::{Duration, Local, Utc};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use library_circulation::app::get_default_db_path;
use library_circulation::config::config_manager::ConfigManager;
use library_circulation::db::open_sqlite_connection;
use library_circulation::domain::{Author, Book, BookAuthor, Category, Member, Reservation};
use library_circulation::engine::{CirculationEngine, CirculationRepositories};
use library_circulation::repository::{
    AuthorRepository, BookRepository, BorrowRecordRepository, CategoryRepository, FineRepository,
    MemberRepository, ReservationRepository,
};

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));

    // Repositories create their tables on construction.
    let book_repo = Arc::new(BookRepository::from_connection(conn.clone())?);
    let author_repo = Arc::new(AuthorRepository::from_connection(conn.clone())?);
    let category_repo = Arc::new(CategoryRepository::from_connection(conn.clone())?);
    let member_repo = Arc::new(MemberRepository::from_connection(conn.clone())?);
    let borrow_repo = Arc::new(BorrowRecordRepository::from_connection(conn.clone())?);
    let reservation_repo = Arc::new(ReservationRepository::from_connection(conn.clone())?);
    let fine_repo = Arc::new(FineRepository::from_connection(conn.clone())?);
    let config = Arc::new(ConfigManager::from_connection(conn.clone())?);

    let books = seed_catalog(&book_repo, &author_repo, &category_repo)?;
    let members = seed_members(&member_repo)?;

    let engine = CirculationEngine::new(
        CirculationRepositories::new(
            book_repo,
            member_repo,
            borrow_repo.clone(),
            reservation_repo.clone(),
            fine_repo,
        ),
        config,
    );

    seed_circulation(&engine, &borrow_repo, &reservation_repo, &books, &members)?;

    print_quick_counts(conn)?;

    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_catalog(
    book_repo: &BookRepository,
    author_repo: &AuthorRepository,
    category_repo: &CategoryRepository,
) -> Result<Vec<Book>, Box<dyn Error>> {
    let literature = Category::new("文学");
    let computing = Category::new("计算机");
    let history = Category::new("历史");
    for c in [&literature, &computing, &history] {
        category_repo.insert(c)?;
    }

    let qian = Author::new("钱锺书", Some("中国现代作家、文学研究家"));
    let liu = Author::new("刘慈欣", None);
    let knuth = Author::new("Donald Knuth", Some("Stanford computer scientist"));
    let huang = Author::new("黄仁宇", None);
    for a in [&qian, &liu, &knuth, &huang] {
        author_repo.insert(a)?;
    }

    // (title, isbn, copies, category, published_year, author)
    let specs = [
        ("围城", "978-7-02-009000-2", 3, &literature, 1947, &qian),
        ("三体", "978-7-5366-9293-0", 2, &literature, 2008, &liu),
        (
            "The Art of Computer Programming, Vol. 1",
            "978-0-20-189683-1",
            1,
            &computing,
            1968,
            &knuth,
        ),
        ("万历十五年", "978-7-101-05203-1", 2, &history, 1997, &huang),
    ];

    let mut books = Vec::new();
    for (title, isbn, copies, category, year, author) in specs {
        let mut book = Book::new(title, isbn, copies);
        book.category_id = Some(category.category_id.clone());
        book.published_year = Some(year);
        book_repo.insert(&book)?;
        author_repo.link_book(&BookAuthor {
            book_id: book.book_id.clone(),
            author_id: author.author_id.clone(),
        })?;
        books.push(book);
    }

    eprintln!("Seeded {} books", books.len());
    Ok(books)
}

fn seed_members(member_repo: &MemberRepository) -> Result<Vec<Member>, Box<dyn Error>> {
    let mut members = Vec::new();
    let specs = [
        ("张三", "zhangsan@example.com", None),
        ("李四", "lisi@example.com", None),
        ("王五", "wangwu@example.com", Some("13800138000")),
        ("赵六", "zhaoliu@example.com", None),
    ];
    for (name, email, phone) in specs {
        let mut member = Member::new(name, email);
        member.phone = phone.map(str::to_string);
        member_repo.insert(&member)?;
        members.push(member);
    }

    eprintln!("Seeded {} members", members.len());
    Ok(members)
}

fn seed_circulation(
    engine: &CirculationEngine,
    borrow_repo: &BorrowRecordRepository,
    reservation_repo: &ReservationRepository,
    books: &[Book],
    members: &[Member],
) -> Result<(), Box<dyn Error>> {
    let today = Utc::now().date_naive();

    // Backdated loans so the overdue sweep and the overdue report have data
    // to work with right after seeding (default loan period is 14 days).
    borrow_repo.borrow_with_decrement(
        &members[0].member_id,
        &books[0].book_id,
        Utc::now() - Duration::days(30),
    )?;
    borrow_repo.borrow_with_decrement(
        &members[1].member_id,
        &books[1].book_id,
        Utc::now() - Duration::days(20),
    )?;

    // A fresh loan that stays inside the loan period.
    borrow_repo.borrow_with_decrement(
        &members[2].member_id,
        &books[2].book_id,
        Utc::now() - Duration::days(3),
    )?;

    // A loan returned late: the fine is issued by the return itself.
    let late = borrow_repo.borrow_with_decrement(
        &members[3].member_id,
        &books[3].book_id,
        Utc::now() - Duration::days(25),
    )?;
    let outcome = engine.return_book(&late.record_id)?;
    eprintln!(
        "Returned record {} ({})",
        late.record_id,
        if outcome.fine.is_some() {
            "fine issued"
        } else {
            "no fine"
        }
    );

    // One pending reservation on the most popular title.
    reservation_repo.insert(&Reservation::new(
        &members[2].member_id,
        &books[0].book_id,
        today,
    ))?;

    // Issue fines for the loans that are already overdue.
    let sweep = engine.sweep_overdue(today)?;
    eprintln!(
        "Sweep scanned {} active records, issued {} fines",
        sweep.scanned, sweep.issued
    );

    Ok(())
}

fn print_quick_counts(conn: Arc<Mutex<rusqlite::Connection>>) -> Result<(), Box<dyn Error>> {
    let conn = conn
        .lock()
        .map_err(|e| format!("connection lock poisoned: {}", e))?;
    let tables = [
        "book",
        "author",
        "category",
        "book_author",
        "member",
        "borrow_record",
        "reservation",
        "fine",
    ];

    eprintln!("Row counts:");
    for t in tables {
        let sql = format!("SELECT COUNT(*) FROM {}", t);
        let c: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        eprintln!("  {:<16} {}", t, c);
    }
    Ok(())
}
