use super::*;

/// Tests inserting a new server record.
///
/// Verifies the server starts in `creating`, is private, and freezes the given
/// hourly cost.
///
/// Expected: Ok with a `creating` server owned by the user
#[tokio::test]
async fn inserts_creating_server() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let owner_id = user.discord_id.parse::<u64>().unwrap();
    let now = Utc::now();

    let repo = GameServerRepository::new(db);
    let server = repo
        .create(CreateServerParam {
            owner_id,
            guild_id: None,
            name: "box1".to_string(),
            game_type: "minecraft".to_string(),
            cost_per_hour: 5,
            now,
        })
        .await?;

    assert_eq!(server.owner_id, owner_id);
    assert_eq!(server.name, "box1");
    assert_eq!(server.status, ServerStatus::Creating);
    assert_eq!(server.cost_per_hour, 5);
    assert!(!server.is_public);
    assert!(server.external_id.is_none());

    let found = repo.find_by_owner_and_name(owner_id, "box1").await?;
    assert_eq!(found.map(|s| s.id), Some(server.id));

    Ok(())
}

/// Tests that names are scoped per owner.
///
/// Expected: two owners can each have a server named "box1"
#[tokio::test]
async fn same_name_for_different_owners() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let first = create_user(db).await?;
    let second = create_user(db).await?;
    GameServerFactory::new(db, &first.discord_id)
        .name("box1")
        .build()
        .await?;

    let repo = GameServerRepository::new(db);
    let second_id = second.discord_id.parse::<u64>().unwrap();
    assert!(repo.find_by_owner_and_name(second_id, "box1").await?.is_none());

    repo.create(CreateServerParam {
        owner_id: second_id,
        guild_id: None,
        name: "box1".to_string(),
        game_type: "minecraft".to_string(),
        cost_per_hour: 5,
        now: Utc::now(),
    })
    .await?;

    assert_eq!(repo.list_all().await?.len(), 2);

    Ok(())
}
