use super::*;

/// Tests that the active-only listing skips disabled game types.
///
/// Expected: Ok with 1 active entry and 2 entries in total
#[tokio::test]
async fn filters_inactive_entries() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::Pricing)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    create_pricing(db, "minecraft", 5).await?;
    PricingFactory::new(db, "cs2").active(false).build().await?;

    let repo = PricingRepository::new(db);
    assert_eq!(repo.list(true).await?.len(), 1);
    assert_eq!(repo.list(false).await?.len(), 2);
    assert_eq!(repo.count().await?, 2);

    Ok(())
}

/// Tests inserting a new entry.
///
/// Expected: Ok with an active entry
#[tokio::test]
async fn inserts_active_entry() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::Pricing)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PricingRepository::new(db);
    let entry = repo
        .insert(
            AddGameTypeParam {
                game_type: "valheim".to_string(),
                display_name: "Valheim".to_string(),
                description: "Viking survival".to_string(),
                cost_per_hour: 7,
                min_credits: 10,
            },
            Utc::now(),
        )
        .await?;

    assert!(entry.is_active);
    assert_eq!(entry.required_balance(), 10);
    assert!(repo.find("valheim").await?.is_some());

    Ok(())
}
