use super::*;

/// Tests crediting a positive amount.
///
/// Expected: Ok(true) with the balance increased
#[tokio::test]
async fn credits_positive_amount() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let user = UserFactory::new(db).balance(10).build().await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    assert!(repo.adjust_balance(user_id, 15).await?);

    let account = repo.find(user_id).await?.unwrap();
    assert_eq!(account.balance, 25);

    Ok(())
}

/// Tests debiting exactly the whole balance.
///
/// Expected: Ok(true) with balance 0
#[tokio::test]
async fn debits_to_zero() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let user = UserFactory::new(db).balance(5).build().await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    assert!(repo.adjust_balance(user_id, -5).await?);
    assert_eq!(repo.find(user_id).await?.unwrap().balance, 0);

    Ok(())
}

/// Tests that a debit larger than the balance is rejected without clamping.
///
/// Expected: Ok(false) with the balance unchanged
#[tokio::test]
async fn rejects_overdraft() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let user = UserFactory::new(db).balance(4).build().await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    assert!(!repo.adjust_balance(user_id, -5).await?);
    assert_eq!(repo.find(user_id).await?.unwrap().balance, 4);

    Ok(())
}

/// Tests that two debits which only fit once cannot both succeed.
///
/// Expected: first Ok(true), second Ok(false), balance never negative
#[tokio::test]
async fn second_competing_debit_fails() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let user = UserFactory::new(db).balance(8).build().await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    let first = repo.adjust_balance(user_id, -5).await?;
    let second = repo.adjust_balance(user_id, -5).await?;

    assert!(first);
    assert!(!second);
    assert_eq!(repo.find(user_id).await?.unwrap().balance, 3);

    Ok(())
}

/// Tests adjusting a missing account.
///
/// Expected: Ok(false)
#[tokio::test]
async fn missing_account_is_not_updated() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = UserRepository::new(db);
    assert!(!repo.adjust_balance(999, 10).await?);

    Ok(())
}

/// Tests a delta of `i64::MIN`, which cannot be negated.
///
/// Expected: Ok(false) without panicking, balance unchanged
#[tokio::test]
async fn rejects_minimum_delta() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let user = UserFactory::new(db).balance(i64::MAX).build().await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    assert!(!repo.adjust_balance(user_id, i64::MIN).await?);

    let account = repo.find(user_id).await?.unwrap();
    assert_eq!(account.balance, i64::MAX);

    Ok(())
}
