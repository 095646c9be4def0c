use super::*;

/// Tests inserting a schedule.
///
/// Expected: Ok with an enabled schedule holding the given next run
#[tokio::test]
async fn inserts_enabled_schedule() -> Result<(), AppError> {
    let test = TestBuilder::new().with_server_tables().build().await.unwrap();
    let db = test.db.as_ref().unwrap();

    let user = create_user(db).await?;
    let server = create_server(db, &user.discord_id, "stopped").await?;
    let owner_id = user.discord_id.parse::<u64>().unwrap();
    let next_run = Utc::now() + Duration::hours(2);

    let repo = ScheduleRepository::new(db);
    let schedule = repo
        .create(
            CreateScheduleParam {
                server_id: server.id,
                owner_id,
                action: ScheduleAction::Start,
                cron_expression: "0 18 * * *".to_string(),
                timezone: "Europe/Berlin".to_string(),
            },
            Some(next_run),
            Utc::now(),
        )
        .await?;

    assert!(schedule.enabled);
    assert_eq!(schedule.action, ScheduleAction::Start);
    assert_eq!(schedule.owner_id, owner_id);
    assert!(schedule.next_run.is_some());
    assert!(schedule.last_run.is_none());

    Ok(())
}
