use super::*;
use sea_orm::{EntityTrait, PaginatorTrait};

/// Tests creating an account on first interaction.
///
/// Verifies that an unknown Discord ID gets a new free-tier account with an empty
/// balance and no reward history.
///
/// Expected: Ok with a zero-balance free account
#[tokio::test]
async fn creates_missing_account() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = UserRepository::new(db);
    let account = repo.get_or_create(42, Utc::now()).await?;

    assert_eq!(account.user_id, 42);
    assert_eq!(account.balance, 0);
    assert_eq!(account.tier, Tier::Free);
    assert!(account.last_daily.is_none());
    assert!(account.last_work.is_none());

    Ok(())
}

/// Tests that an existing account is returned unchanged.
///
/// Expected: Ok with the stored balance and tier
#[tokio::test]
async fn returns_existing_account() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    UserFactory::new(db)
        .discord_id("77")
        .balance(250)
        .tier("premium")
        .build()
        .await?;

    let repo = UserRepository::new(db);
    let account = repo.get_or_create(77, Utc::now()).await?;

    assert_eq!(account.balance, 250);
    assert_eq!(account.tier, Tier::Premium);

    Ok(())
}

/// Tests that repeated calls never create a second account.
///
/// Expected: Ok with one row after two calls
#[tokio::test]
async fn is_idempotent() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = UserRepository::new(db);
    repo.get_or_create(5, Utc::now()).await?;
    repo.get_or_create(5, Utc::now()).await?;

    let count = entity::prelude::User::find().count(db).await?;
    assert_eq!(count, 1);

    Ok(())
}
