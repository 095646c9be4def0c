use super::*;

/// Tests a transition from an allowed state.
///
/// Expected: Ok(true), status stopping and public flag cleared
#[tokio::test]
async fn applies_from_allowed_state() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = GameServerFactory::new(db, &user.discord_id)
        .status("running")
        .public(true)
        .build()
        .await?;

    let repo = GameServerRepository::new(db);
    let applied = repo
        .transition(
            server.id,
            &[ServerStatus::Running, ServerStatus::Ready],
            StatusChange::stopping(),
        )
        .await?;

    assert!(applied);
    let server = repo.find_by_id(server.id).await?.unwrap();
    assert_eq!(server.status, ServerStatus::Stopping);
    assert!(!server.is_public);

    Ok(())
}

/// Tests that a transition from a disallowed state changes nothing.
///
/// Expected: Ok(false) and the status is still stopped
#[tokio::test]
async fn rejects_from_other_state() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "stopped").await?;

    let repo = GameServerRepository::new(db);
    let applied = repo
        .transition(server.id, &[ServerStatus::Running], StatusChange::stopping())
        .await?;

    assert!(!applied);
    assert_eq!(
        repo.find_by_id(server.id).await?.unwrap().status,
        ServerStatus::Stopped
    );

    Ok(())
}

/// Tests that only the first of two racing transitions wins.
///
/// Expected: first Ok(true), second Ok(false)
#[tokio::test]
async fn second_racing_transition_loses() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "running").await?;

    let repo = GameServerRepository::new(db);
    let active = [ServerStatus::Running, ServerStatus::Ready];
    let stop = repo
        .transition(server.id, &active, StatusChange::stopping())
        .await?;
    let restart = repo
        .transition(server.id, &active, StatusChange::creating())
        .await?;

    assert!(stop);
    assert!(!restart);
    assert_eq!(
        repo.find_by_id(server.id).await?.unwrap().status,
        ServerStatus::Stopping
    );

    Ok(())
}

/// Tests that entering `creating` clears the stop timestamp and previous error.
///
/// Expected: Ok(true) with stopped_at and error_message cleared
#[tokio::test]
async fn creating_clears_stop_and_error() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = GameServerFactory::new(db, &user.discord_id)
        .status("stopped")
        .stopped_at(Some(Utc::now() - Duration::hours(1)))
        .build()
        .await?;

    let repo = GameServerRepository::new(db);
    repo.transition(server.id, &[], StatusChange::failed("boom"))
        .await?;
    assert_eq!(
        repo.find_by_id(server.id).await?.unwrap().error_message,
        Some("boom".to_string())
    );

    repo.transition(
        server.id,
        &[ServerStatus::Error],
        StatusChange::creating(),
    )
    .await?;

    let server = repo.find_by_id(server.id).await?.unwrap();
    assert_eq!(server.status, ServerStatus::Creating);
    assert!(server.stopped_at.is_none());
    assert!(server.error_message.is_none());

    Ok(())
}

/// Tests recording the provisioned address.
///
/// Expected: external ID, address and port are stored
#[tokio::test]
async fn records_provisioned_address() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "creating").await?;

    let repo = GameServerRepository::new(db);
    repo.set_provisioned(
        server.id,
        ProvisionedAddress {
            external_id: "gs-abc".to_string(),
            address: "10.0.0.5".to_string(),
            port: 25565,
        },
    )
    .await?;

    let server = repo.find_by_id(server.id).await?.unwrap();
    assert_eq!(server.external_id.as_deref(), Some("gs-abc"));
    assert_eq!(server.connect_address().as_deref(), Some("10.0.0.5:25565"));

    Ok(())
}

/// Tests recording an address for a server that already left `creating`.
///
/// Expected: Ok(false) and the stopped record keeps no external ID
#[tokio::test]
async fn ignores_provisioned_address_after_stop() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "stopped").await?;

    let repo = GameServerRepository::new(db);
    let recorded = repo
        .set_provisioned(
            server.id,
            ProvisionedAddress {
                external_id: "gs-late".to_string(),
                address: "10.0.0.9".to_string(),
                port: 25565,
            },
        )
        .await?;

    assert!(!recorded);
    let server = repo.find_by_id(server.id).await?.unwrap();
    assert_eq!(server.status, ServerStatus::Stopped);
    assert!(server.external_id.is_none());

    Ok(())
}

/// Tests that only stopped servers can be hard-deleted.
///
/// Expected: Ok(false) for a running server, Ok(true) once it is stopped
#[tokio::test]
async fn deletes_only_stopped_servers() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "running").await?;

    let repo = GameServerRepository::new(db);
    assert!(!repo.delete_stopped(server.id).await?);
    assert!(repo.find_by_id(server.id).await?.is_some());

    repo.transition(server.id, &[], StatusChange::stopped(Utc::now()))
        .await?;
    assert!(repo.delete_stopped(server.id).await?);
    assert!(repo.find_by_id(server.id).await?.is_none());

    Ok(())
}
