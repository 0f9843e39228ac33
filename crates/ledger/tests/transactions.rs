use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use ledger::{
    CategoryKind, Engine, LedgerError, Money, RecordTransactionCmd, SetBudgetCmd, Transaction,
    TransactionKind, UpdateTransactionCmd,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("ledger_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();

    (engine, db, url, path)
}

/// Engine plus one user with one account and one "Food" expense category.
async fn setup() -> (Engine, DatabaseConnection, i64, i64, i64) {
    let (engine, db) = engine_with_db().await;
    let user = engine
        .register_user("Alice", "alice@example.com", "bcrypt-hash")
        .await
        .unwrap();
    let account = engine.new_account(user.id, "Checking", None).await.unwrap();
    let category = engine
        .new_category(user.id, "Food", CategoryKind::Expense, 0, None)
        .await
        .unwrap();
    (engine, db, user.id, account.id, category.id)
}

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, n).unwrap()
}

async fn spend(
    engine: &Engine,
    user: i64,
    account: i64,
    category: i64,
    cents: i64,
) -> Result<Transaction, LedgerError> {
    engine
        .record_transaction(
            RecordTransactionCmd::new(
                user,
                account,
                TransactionKind::Expense,
                Money::new(cents),
                day(12),
            )
            .category_id(category),
        )
        .await
}

async fn set_cap(engine: &Engine, user: i64, category: i64, cents: i64) {
    engine
        .set_budget(SetBudgetCmd {
            user_id: user,
            category_id: category,
            budget_amount: Money::new(cents),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn uncapped_records_accumulate_their_sum() {
    let (engine, _db, user, account, category) = setup().await;

    for cents in [1200, 350, 4450] {
        spend(&engine, user, account, category, cents).await.unwrap();
    }

    let budget = engine.budget(user, category).await.unwrap();
    assert_eq!(budget.budget_amount.cents(), 0);
    assert_eq!(budget.total_amount.cents(), 6000);
}

#[tokio::test]
async fn cap_rejects_overflow_and_leaves_state_unchanged() {
    let (engine, _db, user, account, category) = setup().await;
    set_cap(&engine, user, category, 10_000).await;

    spend(&engine, user, account, category, 9_000).await.unwrap();

    let err = spend(&engine, user, account, category, 2_000)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::BudgetExceeded("Food".to_string()));

    // No transaction row persisted, no accumulation changed.
    let budget = engine.budget(user, category).await.unwrap();
    assert_eq!(budget.total_amount.cents(), 9_000);
    let transactions = engine.transactions(user, None).await.unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn cap_boundary_allows_exact_fill() {
    let (engine, _db, user, account, category) = setup().await;
    set_cap(&engine, user, category, 10_000).await;

    spend(&engine, user, account, category, 9_000).await.unwrap();
    spend(&engine, user, account, category, 1_000).await.unwrap();

    let budget = engine.budget(user, category).await.unwrap();
    assert_eq!(budget.total_amount.cents(), 10_000);
}

#[tokio::test]
async fn rejected_record_retried_after_raising_cap_persists_once() {
    let (engine, _db, user, account, category) = setup().await;
    set_cap(&engine, user, category, 10_000).await;
    spend(&engine, user, account, category, 9_000).await.unwrap();

    let err = spend(&engine, user, account, category, 2_000)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::BudgetExceeded("Food".to_string()));

    set_cap(&engine, user, category, 20_000).await;
    spend(&engine, user, account, category, 2_000).await.unwrap();

    let transactions = engine.transactions(user, None).await.unwrap();
    assert_eq!(transactions.len(), 2);
    let budget = engine.budget(user, category).await.unwrap();
    assert_eq!(budget.total_amount.cents(), 11_000);
}

#[tokio::test]
async fn delete_reverses_accumulation() {
    let (engine, _db, user, account, category) = setup().await;

    let tx = spend(&engine, user, account, category, 5_000).await.unwrap();
    assert_eq!(
        engine.budget(user, category).await.unwrap().total_amount.cents(),
        5_000
    );

    engine.delete_transaction(user, tx.id).await.unwrap();

    let budget = engine.budget(user, category).await.unwrap();
    assert_eq!(budget.total_amount.cents(), 0);
    let err = engine.transaction(user, tx.id).await.unwrap_err();
    assert_eq!(err, LedgerError::NotFound("transaction not exists".to_string()));
}

#[tokio::test]
async fn delete_without_budget_row_still_deletes() {
    let (engine, db, user, account, category) = setup().await;
    let tx = spend(&engine, user, account, category, 5_000).await.unwrap();

    // Simulate a transaction that predates budget tracking.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM budgets WHERE user_id = ? AND category_id = ?;",
        vec![user.into(), category.into()],
    ))
    .await
    .unwrap();

    engine.delete_transaction(user, tx.id).await.unwrap();

    let err = engine.transaction(user, tx.id).await.unwrap_err();
    assert_eq!(err, LedgerError::NotFound("transaction not exists".to_string()));
}

#[tokio::test]
async fn delete_does_not_clamp_negative_totals() {
    let (engine, db, user, account, category) = setup().await;
    let tx = spend(&engine, user, account, category, 5_000).await.unwrap();

    // Corrupt the accumulator so the reversal undershoots zero.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE budgets SET total_amount = ? WHERE user_id = ? AND category_id = ?;",
        vec![2_000i64.into(), user.into(), category.into()],
    ))
    .await
    .unwrap();

    engine.delete_transaction(user, tx.id).await.unwrap();

    let budget = engine.budget(user, category).await.unwrap();
    assert_eq!(budget.total_amount.cents(), -3_000);
}

#[tokio::test]
async fn update_amount_adjusts_total_by_delta() {
    let (engine, _db, user, account, category) = setup().await;
    let tx = spend(&engine, user, account, category, 10_000).await.unwrap();

    engine
        .update_transaction(
            user,
            tx.id,
            UpdateTransactionCmd::default().amount(Money::new(15_000)),
        )
        .await
        .unwrap();
    assert_eq!(
        engine.budget(user, category).await.unwrap().total_amount.cents(),
        15_000
    );

    engine
        .update_transaction(
            user,
            tx.id,
            UpdateTransactionCmd::default().amount(Money::new(12_000)),
        )
        .await
        .unwrap();
    assert_eq!(
        engine.budget(user, category).await.unwrap().total_amount.cents(),
        12_000
    );
}

#[tokio::test]
async fn update_rechecks_cap_against_adjusted_total() {
    let (engine, _db, user, account, category) = setup().await;
    set_cap(&engine, user, category, 20_000).await;
    let tx = spend(&engine, user, account, category, 15_000).await.unwrap();

    let err = engine
        .update_transaction(
            user,
            tx.id,
            UpdateTransactionCmd::default().amount(Money::new(25_000)),
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::BudgetExceeded("Food".to_string()));

    // Neither the transaction nor the accumulator changed.
    let stored = engine.transaction(user, tx.id).await.unwrap();
    assert_eq!(stored.amount.cents(), 15_000);
    assert_eq!(
        engine.budget(user, category).await.unwrap().total_amount.cents(),
        15_000
    );
}

#[tokio::test]
async fn update_of_date_and_description_leaves_total_alone() {
    let (engine, _db, user, account, category) = setup().await;
    let tx = spend(&engine, user, account, category, 10_000).await.unwrap();

    let updated = engine
        .update_transaction(
            user,
            tx.id,
            UpdateTransactionCmd::default()
                .date(day(20))
                .description("bigger lunch"),
        )
        .await
        .unwrap();

    assert_eq!(updated.date, day(20));
    assert_eq!(updated.description.as_deref(), Some("bigger lunch"));
    assert_eq!(
        engine.budget(user, category).await.unwrap().total_amount.cents(),
        10_000
    );
}

#[tokio::test]
async fn update_with_empty_patch_fails() {
    let (engine, _db, user, account, category) = setup().await;
    let tx = spend(&engine, user, account, category, 1_000).await.unwrap();

    let err = engine
        .update_transaction(user, tx.id, UpdateTransactionCmd::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidArgument("no fields to update".to_string())
    );
}

#[tokio::test]
async fn record_rejects_nonpositive_amounts() {
    let (engine, _db, user, account, category) = setup().await;

    for cents in [0, -500] {
        let err = spend(&engine, user, account, category, cents)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidArgument("amount must be > 0".to_string())
        );
    }
}

#[tokio::test]
async fn record_requires_owned_account_and_category() {
    let (engine, _db, user, account, category) = setup().await;
    let bob = engine
        .register_user("Bob", "bob@example.com", "bcrypt-hash")
        .await
        .unwrap();

    // Bob cannot spend from Alice's account or category.
    let err = spend(&engine, bob.id, account, category, 1_000)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("account not exists".to_string()));

    let bob_account = engine.new_account(bob.id, "Checking", None).await.unwrap();
    let err = spend(&engine, bob.id, bob_account.id, category, 1_000)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("category not exists".to_string()));

    let err = spend(&engine, user, account, 9_999, 1_000).await.unwrap_err();
    assert_eq!(err, LedgerError::NotFound("category not exists".to_string()));
}

#[tokio::test]
async fn record_on_soft_deleted_category_fails() {
    let (engine, _db, user, account, category) = setup().await;
    engine.delete_category(user, category).await.unwrap();

    let err = spend(&engine, user, account, category, 1_000)
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("category not exists".to_string()));
}

#[tokio::test]
async fn uncategorized_record_skips_budget_tracking() {
    let (engine, _db, user, account, _category) = setup().await;

    engine
        .record_transaction(RecordTransactionCmd::new(
            user,
            account,
            TransactionKind::Income,
            Money::new(123_00),
            day(1),
        ))
        .await
        .unwrap();

    assert!(engine.budgets(user).await.unwrap().is_empty());
    assert_eq!(engine.transactions(user, None).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_records_on_one_pair_lose_no_updates() {
    // File-backed DB: every pooled connection must see the same tables.
    let (engine, _db, _url, path) = engine_with_file_db().await;
    let alice = engine
        .register_user("Alice", "alice@example.com", "bcrypt-hash")
        .await
        .unwrap();
    let user = alice.id;
    let account = engine.new_account(user, "Checking", None).await.unwrap().id;
    let category = engine
        .new_category(user, "Food", CategoryKind::Expense, 0, None)
        .await
        .unwrap()
        .id;
    let engine = std::sync::Arc::new(engine);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .record_transaction(
                    RecordTransactionCmd::new(
                        user,
                        account,
                        TransactionKind::Expense,
                        Money::new(1),
                        day(12),
                    )
                    .category_id(category),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let budget = engine.budget(user, category).await.unwrap();
    assert_eq!(budget.total_amount.cents(), 16);
    assert_eq!(engine.transactions(user, None).await.unwrap().len(), 16);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn transactions_list_is_newest_first_and_limited() {
    let (engine, _db, user, account, category) = setup().await;

    for n in [1, 20, 10] {
        engine
            .record_transaction(
                RecordTransactionCmd::new(
                    user,
                    account,
                    TransactionKind::Expense,
                    Money::new(100),
                    day(n),
                )
                .category_id(category),
            )
            .await
            .unwrap();
    }

    let all = engine.transactions(user, None).await.unwrap();
    let dates: Vec<_> = all.iter().map(|tx| tx.date).collect();
    assert_eq!(dates, vec![day(20), day(10), day(1)]);

    let limited = engine.transactions(user, Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn restart_reads_same_accumulated_state() {
    let (engine, db, url, path) = engine_with_file_db().await;
    let user = engine
        .register_user("Alice", "alice@example.com", "bcrypt-hash")
        .await
        .unwrap();
    let account = engine.new_account(user.id, "Checking", None).await.unwrap();
    let category = engine
        .new_category(user.id, "Food", CategoryKind::Expense, 0, None)
        .await
        .unwrap();
    spend(&engine, user.id, account.id, category.id, 4_200)
        .await
        .unwrap();

    drop(engine);
    drop(db);

    let db2 = Database::connect(&url).await.unwrap();
    let engine2 = Engine::builder().database(db2.clone()).build();

    let budget = engine2.budget(user.id, category.id).await.unwrap();
    assert_eq!(budget.total_amount.cents(), 4_200);

    drop(db2);
    let _ = std::fs::remove_file(path);
}
