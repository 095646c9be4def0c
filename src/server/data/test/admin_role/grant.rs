use super::*;

/// Tests that granting twice replaces the level instead of duplicating the row.
///
/// Expected: one grant with the latest level
#[tokio::test]
async fn regrant_replaces_level() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::AdminRole)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = AdminRoleRepository::new(db);
    repo.grant(1, 10, Capability::Moderator, Utc::now()).await?;
    repo.grant(1, 10, Capability::Admin, Utc::now()).await?;

    let grants = repo.list(1).await?;
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].level, Capability::Admin);

    Ok(())
}

/// Tests resolving the highest capability across several roles.
///
/// Expected: Admin wins over Moderator; unknown roles give None
#[tokio::test]
async fn resolves_highest_capability() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::AdminRole)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = AdminRoleRepository::new(db);
    repo.grant(1, 10, Capability::Moderator, Utc::now()).await?;
    repo.grant(1, 11, Capability::Admin, Utc::now()).await?;

    assert_eq!(
        repo.highest_for_roles(1, &[10, 11]).await?,
        Some(Capability::Admin)
    );
    assert_eq!(repo.highest_for_roles(1, &[99]).await?, None);
    assert_eq!(repo.highest_for_roles(2, &[10]).await?, None);

    Ok(())
}

/// Tests revoking a grant.
///
/// Expected: first revoke Ok(true), second Ok(false)
#[tokio::test]
async fn revokes_grant() -> Result<(), AppError> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::AdminRole)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = AdminRoleRepository::new(db);
    repo.grant(1, 10, Capability::Moderator, Utc::now()).await?;

    assert!(repo.revoke(1, 10).await?);
    assert!(!repo.revoke(1, 10).await?);

    Ok(())
}
