use super::*;

/// Tests claiming a reward that was never claimed before.
///
/// Expected: Ok(true) with the amount credited and the claim time stored
#[tokio::test]
async fn first_claim_succeeds() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let user = UserFactory::new(db).build().await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();
    let now = Utc::now();

    let repo = UserRepository::new(db);
    assert!(repo.claim_reward(user_id, RewardKind::Daily, 100, now).await?);

    let account = repo.find(user_id).await?.unwrap();
    assert_eq!(account.balance, 100);
    assert!(account.last_daily.is_some());
    assert!(account.last_work.is_none());

    Ok(())
}

/// Tests claiming while the cooldown is active.
///
/// Expected: Ok(false) with balance and timestamp unchanged
#[tokio::test]
async fn rejects_claim_within_cooldown() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let now = Utc::now();
    let last_work = now - Duration::minutes(30);
    let user = UserFactory::new(db)
        .balance(10)
        .last_work(Some(last_work))
        .build()
        .await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    assert!(!repo.claim_reward(user_id, RewardKind::Work, 25, now).await?);

    let account = repo.find(user_id).await?.unwrap();
    assert_eq!(account.balance, 10);
    let stored = account.last_work.unwrap();
    assert_eq!((stored - last_work).num_milliseconds(), 0);

    Ok(())
}

/// Tests claiming once the cooldown window has fully elapsed.
///
/// Expected: Ok(true)
#[tokio::test]
async fn allows_claim_after_cooldown() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let now = Utc::now();
    let user = UserFactory::new(db)
        .last_daily(Some(now - Duration::hours(25)))
        .build()
        .await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    assert!(repo.claim_reward(user_id, RewardKind::Daily, 100, now).await?);

    Ok(())
}

/// Tests that a zero-valued (epoch) claim time counts as never claimed.
///
/// Expected: Ok(true) even though `now` is close to the epoch
#[tokio::test]
async fn epoch_claim_time_is_eligible() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let epoch = chrono::DateTime::<Utc>::UNIX_EPOCH;
    let user = UserFactory::new(db).last_daily(Some(epoch)).build().await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    let now = epoch + Duration::hours(1);
    assert!(repo.claim_reward(user_id, RewardKind::Daily, 100, now).await?);

    Ok(())
}

/// Tests that cooldowns are tracked per reward kind.
///
/// Expected: a recent daily claim does not block a work claim
#[tokio::test]
async fn cooldowns_are_independent() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let now = Utc::now();
    let user = UserFactory::new(db)
        .last_daily(Some(now - Duration::minutes(1)))
        .build()
        .await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    assert!(repo.claim_reward(user_id, RewardKind::Work, 25, now).await?);

    Ok(())
}
