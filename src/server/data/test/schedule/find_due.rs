use super::*;

/// Tests selecting due schedules.
///
/// Verifies that enabled schedules with a past `next_run` are returned while future and
/// disabled schedules are skipped.
///
/// Expected: Ok with exactly the due, enabled schedule
#[tokio::test]
async fn returns_enabled_due_schedules() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "stopped").await?;
    let now = Utc::now();

    let due = ScheduleFactory::new(db, server.id, &user.discord_id)
        .next_run(Some(now - Duration::minutes(1)))
        .build()
        .await?;
    ScheduleFactory::new(db, server.id, &user.discord_id)
        .next_run(Some(now + Duration::minutes(10)))
        .build()
        .await?;
    ScheduleFactory::new(db, server.id, &user.discord_id)
        .next_run(Some(now - Duration::minutes(5)))
        .enabled(false)
        .build()
        .await?;

    let repo = ScheduleRepository::new(db);
    let schedules = repo.find_due(now).await?;

    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].id, due.id);

    Ok(())
}

/// Tests claiming a due run.
///
/// Expected: last_run set and next_run moved forward, so the schedule is no longer due
#[tokio::test]
async fn claim_run_moves_next_run() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "stopped").await?;
    let now = Utc::now();
    let due_at = now - Duration::minutes(1);
    let schedule = ScheduleFactory::new(db, server.id, &user.discord_id)
        .next_run(Some(due_at))
        .build()
        .await?;

    let repo = ScheduleRepository::new(db);
    let claimed = repo
        .claim_run(schedule.id, due_at, now, Some(now + Duration::days(1)))
        .await?;

    assert!(claimed);
    let stored = repo.find_by_id(schedule.id).await?.unwrap();
    assert!(stored.last_run.is_some());
    assert!(repo.find_due(now).await?.is_empty());

    Ok(())
}

/// Tests that a run can only be claimed once.
///
/// Verifies that a second claim against the same previous `next_run` matches nothing.
///
/// Expected: first claim Ok(true), second Ok(false), next_run from the first claim kept
#[tokio::test]
async fn claim_run_only_once() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "stopped").await?;
    let now = Utc::now();
    let due_at = now - Duration::minutes(1);
    let schedule = ScheduleFactory::new(db, server.id, &user.discord_id)
        .next_run(Some(due_at))
        .build()
        .await?;

    let repo = ScheduleRepository::new(db);
    let first_next = now + Duration::hours(1);
    assert!(repo.claim_run(schedule.id, due_at, now, Some(first_next)).await?);
    assert!(
        !repo
            .claim_run(schedule.id, due_at, now, Some(now + Duration::hours(2)))
            .await?
    );

    let stored = repo.find_by_id(schedule.id).await?.unwrap();
    assert_eq!(stored.next_run.map(|next| next.timestamp()), Some(first_next.timestamp()));

    Ok(())
}
