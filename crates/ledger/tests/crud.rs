use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use ledger::{
    CategoryKind, Engine, LedgerError, Money, RecordTransactionCmd, SetBudgetCmd, TransactionKind,
    UpdateAccountCmd, UpdateCategoryCmd, User,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn register(engine: &Engine, name: &str, email: &str) -> User {
    engine
        .register_user(name, email, "bcrypt-hash")
        .await
        .unwrap()
}

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, n).unwrap()
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let (engine, _db) = engine_with_db().await;
    register(&engine, "Alice", "alice@example.com").await;

    let err = engine
        .register_user("Other Alice", "Alice@Example.com", "bcrypt-hash")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Conflict("email alice@example.com already registered".to_string())
    );
}

#[tokio::test]
async fn register_rejects_malformed_input() {
    let (engine, _db) = engine_with_db().await;

    assert!(matches!(
        engine.register_user("  ", "a@b.example", "h").await,
        Err(LedgerError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.register_user("Alice", "not-an-email", "h").await,
        Err(LedgerError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn account_names_are_unique_per_user_not_globally() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;
    let bob = register(&engine, "Bob", "bob@example.com").await;

    engine
        .new_account(alice.id, "Checking", None)
        .await
        .unwrap();
    let err = engine
        .new_account(alice.id, "Checking", None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Conflict("account name \"Checking\" already taken".to_string())
    );

    // Same name under another user is fine.
    engine.new_account(bob.id, "Checking", None).await.unwrap();
}

#[tokio::test]
async fn account_rename_checks_uniqueness_and_keeps_balance() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;
    let checking = engine
        .new_account(alice.id, "Checking", Some(Money::new(10_00)))
        .await
        .unwrap();
    engine.new_account(alice.id, "Savings", None).await.unwrap();

    let err = engine
        .update_account(
            alice.id,
            checking.id,
            UpdateAccountCmd {
                account_name: Some("Savings".to_string()),
                account_balance: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));

    let renamed = engine
        .update_account(
            alice.id,
            checking.id,
            UpdateAccountCmd {
                account_name: Some("Daily".to_string()),
                account_balance: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Daily");
    assert_eq!(renamed.balance, Some(Money::new(10_00)));
}

#[tokio::test]
async fn account_with_transactions_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;
    let account = engine
        .new_account(alice.id, "Checking", None)
        .await
        .unwrap();

    let tx = engine
        .record_transaction(RecordTransactionCmd::new(
            alice.id,
            account.id,
            TransactionKind::Expense,
            Money::new(500),
            day(1),
        ))
        .await
        .unwrap();

    let err = engine.delete_account(alice.id, account.id).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::Conflict("account has transactions and cannot be deleted".to_string())
    );

    // Account and transaction are both still present.
    assert!(engine.account(alice.id, account.id).await.is_ok());
    assert!(engine.transaction(alice.id, tx.id).await.is_ok());

    // Removing the transaction unblocks the deletion.
    engine.delete_transaction(alice.id, tx.id).await.unwrap();
    engine.delete_account(alice.id, account.id).await.unwrap();
    assert!(engine.account(alice.id, account.id).await.is_err());
}

#[tokio::test]
async fn category_soft_delete_frees_the_name() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;

    let food = engine
        .new_category(alice.id, "Food", CategoryKind::Expense, 5, Some("meals"))
        .await
        .unwrap();
    let err = engine
        .new_category(alice.id, " Food ", CategoryKind::Expense, 0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));

    engine.delete_category(alice.id, food.id).await.unwrap();
    assert!(engine.categories(alice.id).await.unwrap().is_empty());
    assert!(engine.category(alice.id, food.id).await.is_err());

    // The tombstoned name can be reused.
    engine
        .new_category(alice.id, "Food", CategoryKind::Expense, 0, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn category_update_patches_only_given_fields() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;
    let food = engine
        .new_category(alice.id, "Food", CategoryKind::Expense, 5, Some("meals"))
        .await
        .unwrap();

    let updated = engine
        .update_category(
            alice.id,
            food.id,
            UpdateCategoryCmd {
                name: None,
                sort_order: Some(9),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Food");
    assert_eq!(updated.sort_order, 9);
    assert_eq!(updated.description.as_deref(), Some("meals"));
}

#[tokio::test]
async fn set_budget_creates_then_updates_without_touching_total() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;
    let account = engine
        .new_account(alice.id, "Checking", None)
        .await
        .unwrap();
    let food = engine
        .new_category(alice.id, "Food", CategoryKind::Expense, 0, None)
        .await
        .unwrap();

    let (budget, created) = engine
        .set_budget(SetBudgetCmd {
            user_id: alice.id,
            category_id: food.id,
            budget_amount: Money::new(50_00),
        })
        .await
        .unwrap();
    assert!(created);
    assert_eq!(budget.budget_amount.cents(), 50_00);
    assert_eq!(budget.total_amount.cents(), 0);

    engine
        .record_transaction(
            RecordTransactionCmd::new(
                alice.id,
                account.id,
                TransactionKind::Expense,
                Money::new(20_00),
                day(2),
            )
            .category_id(food.id),
        )
        .await
        .unwrap();

    let (budget, created) = engine
        .set_budget(SetBudgetCmd {
            user_id: alice.id,
            category_id: food.id,
            budget_amount: Money::new(80_00),
        })
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(budget.budget_amount.cents(), 80_00);
    assert_eq!(budget.total_amount.cents(), 20_00);
}

#[tokio::test]
async fn set_budget_backfills_total_from_existing_transactions() {
    let (engine, db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;
    let account = engine
        .new_account(alice.id, "Checking", None)
        .await
        .unwrap();
    let food = engine
        .new_category(alice.id, "Food", CategoryKind::Expense, 0, None)
        .await
        .unwrap();

    for cents in [10_00, 15_00] {
        engine
            .record_transaction(
                RecordTransactionCmd::new(
                    alice.id,
                    account.id,
                    TransactionKind::Expense,
                    Money::new(cents),
                    day(3),
                )
                .category_id(food.id),
            )
            .await
            .unwrap();
    }

    // Drop the budget row to emulate transactions that predate tracking.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM budgets WHERE user_id = ? AND category_id = ?;",
        vec![alice.id.into(), food.id.into()],
    ))
    .await
    .unwrap();

    let (budget, created) = engine
        .set_budget(SetBudgetCmd {
            user_id: alice.id,
            category_id: food.id,
            budget_amount: Money::new(100_00),
        })
        .await
        .unwrap();
    assert!(created);
    assert_eq!(budget.total_amount.cents(), 25_00);
}

#[tokio::test]
async fn set_budget_rejects_negative_caps_and_foreign_categories() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;
    let bob = register(&engine, "Bob", "bob@example.com").await;
    let food = engine
        .new_category(alice.id, "Food", CategoryKind::Expense, 0, None)
        .await
        .unwrap();

    let err = engine
        .set_budget(SetBudgetCmd {
            user_id: alice.id,
            category_id: food.id,
            budget_amount: Money::new(-1),
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidArgument("budget_amount must be >= 0".to_string())
    );

    let err = engine
        .set_budget(SetBudgetCmd {
            user_id: bob.id,
            category_id: food.id,
            budget_amount: Money::new(10_00),
        })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("category not exists".to_string()));

    engine.delete_category(alice.id, food.id).await.unwrap();
    let err = engine
        .set_budget(SetBudgetCmd {
            user_id: alice.id,
            category_id: food.id,
            budget_amount: Money::new(10_00),
        })
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::NotFound("category not exists".to_string()));
}

#[tokio::test]
async fn ownership_scoping_hides_foreign_rows() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "Alice", "alice@example.com").await;
    let bob = register(&engine, "Bob", "bob@example.com").await;

    let account = engine
        .new_account(alice.id, "Checking", None)
        .await
        .unwrap();
    let tx = engine
        .record_transaction(RecordTransactionCmd::new(
            alice.id,
            account.id,
            TransactionKind::Income,
            Money::new(100),
            day(4),
        ))
        .await
        .unwrap();

    assert!(engine.account(bob.id, account.id).await.is_err());
    assert!(engine.transaction(bob.id, tx.id).await.is_err());
    assert!(engine.delete_transaction(bob.id, tx.id).await.is_err());
    assert!(engine.delete_account(bob.id, account.id).await.is_err());

    // Alice still sees everything.
    assert!(engine.account(alice.id, account.id).await.is_ok());
    assert!(engine.transaction(alice.id, tx.id).await.is_ok());
}
