use super::*;

/// Tests creating a guild with its owner as first member.
///
/// Expected: Ok with zero balance, member count 1 and the owner listed as member
#[tokio::test]
async fn creates_guild_with_owner_member() -> Result<(), AppError> {
    let test = TestBuilder::new().with_guild_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let owner_id = owner.discord_id.parse::<u64>().unwrap();

    let txn = db.begin().await?;
    let guild = GuildRepository::new(&txn)
        .create(CreateGuildParam {
            id: "my-guild".to_string(),
            display_name: "My Guild".to_string(),
            owner_id,
            now: Utc::now(),
        })
        .await?;
    txn.commit().await?;

    assert_eq!(guild.id, "my-guild");
    assert_eq!(guild.balance, 0);
    assert_eq!(guild.member_count, 1);

    let repo = GuildRepository::new(db);
    let members = repo.members_by_deposits("my-guild").await?;
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, owner_id);

    Ok(())
}

/// Tests that adding a member bumps the member count.
///
/// Expected: Ok with member count 2 and the user found as member
#[tokio::test]
async fn add_member_increments_count() -> Result<(), AppError> {
    let test = TestBuilder::new().with_guild_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let invitee = create_user(db).await?;
    let guild = GuildFactory::new(db, &owner.discord_id).build().await?;
    let invitee_id = invitee.discord_id.parse::<u64>().unwrap();

    let repo = GuildRepository::new(db);
    repo.add_member(&guild.id, invitee_id, Utc::now()).await?;

    assert_eq!(repo.find_by_id(&guild.id).await?.unwrap().member_count, 2);
    assert!(repo.find_member(&guild.id, invitee_id).await?.is_some());
    assert_eq!(repo.list_for_user(invitee_id).await?.len(), 1);

    Ok(())
}
