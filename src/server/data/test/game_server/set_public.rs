use super::*;

/// Tests listing a running server publicly.
///
/// Expected: Ok(true) and the server appears in the public list
#[tokio::test]
async fn lists_running_server() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "ready").await?;

    let repo = GameServerRepository::new(db);
    assert!(repo.set_public(server.id, true).await?);
    assert_eq!(repo.list_public().await?.len(), 1);

    Ok(())
}

/// Tests that a server which is not up cannot be listed.
///
/// Expected: Ok(false) and the flag stays cleared
#[tokio::test]
async fn refuses_to_list_stopped_server() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "stopped").await?;

    let repo = GameServerRepository::new(db);
    assert!(!repo.set_public(server.id, true).await?);
    assert!(!repo.find_by_id(server.id).await?.unwrap().is_public);

    Ok(())
}

/// Tests that delisting is allowed in any state.
///
/// Expected: Ok(true)
#[tokio::test]
async fn delists_in_any_state() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = GameServerFactory::new(db, &user.discord_id)
        .status("error")
        .public(true)
        .build()
        .await?;

    let repo = GameServerRepository::new(db);
    assert!(repo.set_public(server.id, false).await?);
    assert!(!repo.find_by_id(server.id).await?.unwrap().is_public);

    Ok(())
}
