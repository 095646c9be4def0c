use super::*;

/// Tests that a deposit updates guild totals and the member's tally together.
///
/// Expected: Ok(true) with balance == total_deposits - total_spent
#[tokio::test]
async fn updates_guild_and_member() -> Result<(), AppError> {
    let test = TestBuilder::new().with_guild_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let guild = GuildFactory::new(db, &owner.discord_id).build().await?;
    let owner_id = owner.discord_id.parse::<u64>().unwrap();

    let repo = GuildRepository::new(db);
    assert!(repo.deposit(&guild.id, owner_id, 500).await?);

    let stored = repo.find_by_id(&guild.id).await?.unwrap();
    assert_eq!(stored.balance, 500);
    assert_eq!(stored.total_deposits, 500);
    assert_eq!(stored.balance, stored.total_deposits - stored.total_spent);
    assert_eq!(
        repo.find_member(&guild.id, owner_id).await?.unwrap().total_deposits,
        500
    );

    Ok(())
}

/// Tests that a deposit by a non-member reports failure.
///
/// Expected: Ok(false)
#[tokio::test]
async fn non_member_deposit_reports_failure() -> Result<(), AppError> {
    let test = TestBuilder::new().with_guild_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let stranger = create_user(db).await?;
    let guild = GuildFactory::new(db, &owner.discord_id).build().await?;

    let repo = GuildRepository::new(db);
    let stranger_id = stranger.discord_id.parse::<u64>().unwrap();
    assert!(!repo.deposit(&guild.id, stranger_id, 10).await?);

    Ok(())
}

/// Tests ordering members by contribution.
///
/// Expected: the largest depositor comes first
#[tokio::test]
async fn members_ordered_by_deposits() -> Result<(), AppError> {
    let test = TestBuilder::new().with_guild_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let member = create_user(db).await?;
    let guild = GuildFactory::new(db, &owner.discord_id)
        .balance(100)
        .build()
        .await?;
    create_guild_member(db, &guild.id, &member.discord_id, 300).await?;

    let repo = GuildRepository::new(db);
    let members = repo.members_by_deposits(&guild.id).await?;

    assert_eq!(members.len(), 2);
    assert_eq!(members[0].user_id.to_string(), member.discord_id);
    assert_eq!(members[0].total_deposits, 300);

    Ok(())
}
