use super::*;

/// Tests selecting servers stopped before a cutoff.
///
/// Verifies that only stopped servers with an older `stopped_at` are returned; recently
/// stopped and running servers are excluded.
///
/// Expected: Ok with only the long-stopped server
#[tokio::test]
async fn returns_only_old_stopped_servers() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let now = Utc::now();
    let old = GameServerFactory::new(db, &user.discord_id)
        .status("stopped")
        .stopped_at(Some(now - Duration::hours(3)))
        .build()
        .await?;
    GameServerFactory::new(db, &user.discord_id)
        .status("stopped")
        .stopped_at(Some(now - Duration::minutes(30)))
        .build()
        .await?;
    create_server(db, &user.discord_id, "running").await?;

    let repo = GameServerRepository::new(db);
    let servers = repo.list_stopped_before(now - Duration::hours(2)).await?;

    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].id, old.id);
    assert!(servers[0].is_cleanup_candidate(now));

    Ok(())
}
