use super::*;

/// Tests that listing only returns the requester's schedules.
///
/// Expected: Ok with the owner's schedule only; another user gets an empty list
#[tokio::test]
async fn lists_only_own_schedules() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let other = create_user(db).await?;
    let server = create_server(db, &owner.discord_id, "stopped").await?;
    create_schedule(db, server.id, &owner.discord_id).await?;

    let repo = ScheduleRepository::new(db);
    let owner_id = owner.discord_id.parse::<u64>().unwrap();
    let other_id = other.discord_id.parse::<u64>().unwrap();

    assert_eq!(repo.list_by_server_and_owner(server.id, owner_id).await?.len(), 1);
    assert!(repo
        .list_by_server_and_owner(server.id, other_id)
        .await?
        .is_empty());

    Ok(())
}

/// Tests that a different owner cannot disable a schedule.
///
/// Expected: Ok(false) and the schedule stays enabled
#[tokio::test]
async fn other_owner_cannot_disable() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let other = create_user(db).await?;
    let server = create_server(db, &owner.discord_id, "stopped").await?;
    let schedule = create_schedule(db, server.id, &owner.discord_id).await?;

    let repo = ScheduleRepository::new(db);
    let other_id = other.discord_id.parse::<u64>().unwrap();

    assert!(!repo.set_enabled(schedule.id, other_id, false, None).await?);
    assert!(repo.find_by_id(schedule.id).await?.unwrap().enabled);

    Ok(())
}

/// Tests that a different owner cannot delete a schedule.
///
/// Expected: Ok(false) and the schedule still exists
#[tokio::test]
async fn other_owner_cannot_delete() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let owner = create_user(db).await?;
    let other = create_user(db).await?;
    let server = create_server(db, &owner.discord_id, "stopped").await?;
    let schedule = create_schedule(db, server.id, &owner.discord_id).await?;

    let repo = ScheduleRepository::new(db);
    let other_id = other.discord_id.parse::<u64>().unwrap();
    let owner_id = owner.discord_id.parse::<u64>().unwrap();

    assert!(!repo.delete(schedule.id, other_id).await?);
    assert!(repo.find_by_id(schedule.id).await?.is_some());
    assert!(repo.delete(schedule.id, owner_id).await?);
    assert!(repo.find_by_id(schedule.id).await?.is_none());

    Ok(())
}
