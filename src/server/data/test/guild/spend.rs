use super::*;

/// Tests spending within the balance.
///
/// Expected: Ok(true), balance decreased and total_spent increased by the amount
#[tokio::test]
async fn spends_within_balance() -> Result<(), AppError> {
    let test = TestBuilder::new().with_guild_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let guild = GuildFactory::new(db, &owner.discord_id)
        .balance(500)
        .build()
        .await?;

    let repo = GuildRepository::new(db);
    assert!(repo.spend(&guild.id, 500).await?);

    let stored = repo.find_by_id(&guild.id).await?.unwrap();
    assert_eq!(stored.balance, 0);
    assert_eq!(stored.total_spent, 500);
    assert_eq!(stored.balance, stored.total_deposits - stored.total_spent);

    Ok(())
}

/// Tests that spending beyond the balance changes nothing.
///
/// Expected: Ok(false) with balance and total_spent unchanged
#[tokio::test]
async fn rejects_overspend() -> Result<(), AppError> {
    let test = TestBuilder::new().with_guild_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let guild = GuildFactory::new(db, &owner.discord_id)
        .balance(500)
        .build()
        .await?;

    let repo = GuildRepository::new(db);
    assert!(!repo.spend(&guild.id, 600).await?);

    let stored = repo.find_by_id(&guild.id).await?.unwrap();
    assert_eq!(stored.balance, 500);
    assert_eq!(stored.total_spent, 0);

    Ok(())
}

/// Tests refunding a previous spend.
///
/// Expected: balance restored and the conservation invariant still holds
#[tokio::test]
async fn refund_reverses_spend() -> Result<(), AppError> {
    let test = TestBuilder::new().with_guild_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let guild = GuildFactory::new(db, &owner.discord_id)
        .balance(50)
        .build()
        .await?;

    let repo = GuildRepository::new(db);
    assert!(repo.spend(&guild.id, 20).await?);
    assert!(repo.refund(&guild.id, 20).await?);
    assert!(!repo.refund(&guild.id, 1).await?);

    let stored = repo.find_by_id(&guild.id).await?.unwrap();
    assert_eq!(stored.balance, 50);
    assert_eq!(stored.total_spent, 0);
    assert_eq!(stored.balance, stored.total_deposits - stored.total_spent);

    Ok(())
}
