use super::*;

/// Tests updating a known game type.
///
/// Expected: Ok(true) with the new cost stored
#[tokio::test]
async fn updates_known_game_type() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::Pricing)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    create_pricing(db, "minecraft", 5).await?;

    let repo = PricingRepository::new(db);
    assert!(repo.update_price("minecraft", 9, 9, Utc::now()).await?);
    assert_eq!(repo.find("minecraft").await?.unwrap().cost_per_hour, 9);

    Ok(())
}

/// Tests updating an unknown game type.
///
/// Expected: Ok(false)
#[tokio::test]
async fn unknown_game_type_is_not_updated() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::Pricing)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PricingRepository::new(db);
    assert!(!repo.update_price("factorio", 9, 9, Utc::now()).await?);

    Ok(())
}
