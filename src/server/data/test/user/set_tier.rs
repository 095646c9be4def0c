use super::*;

/// Tests upgrading an account to premium.
///
/// Expected: Ok(true) and the stored tier is premium
#[tokio::test]
async fn upgrades_to_premium() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let user = UserFactory::new(db).build().await?;
    let user_id = user.discord_id.parse::<u64>().unwrap();

    let repo = UserRepository::new(db);
    assert!(repo.set_tier(user_id, Tier::Premium).await?);
    assert_eq!(repo.find(user_id).await?.unwrap().tier, Tier::Premium);

    Ok(())
}

/// Tests changing the tier of an unknown user.
///
/// Expected: Ok(false)
#[tokio::test]
async fn unknown_user_is_not_updated() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::User)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = UserRepository::new(db);
    assert!(!repo.set_tier(1, Tier::Premium).await?);

    Ok(())
}
