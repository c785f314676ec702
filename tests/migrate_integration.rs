//! Bucket migrations end to end, against the in-memory object store.

use pretty_assertions::assert_eq;
use strata::s3migrate::{
    Action, DirAssets, DirSource, Driver, EnvExpandingSource, MapEnv, MemoryAssets,
    MemoryObjectStore, MigrationError, MigrationState, Migrator, ObjectStore, S3Driver, STATE_KEY,
    Statement, parse_statements,
};

#[tokio::test]
async fn test_version_round_trip() {
    let store = MemoryObjectStore::new("media");
    let driver = S3Driver::open(store.clone(), MemoryAssets::new())
        .await
        .unwrap();

    assert_eq!(driver.version().await.unwrap(), MigrationState::new(-1, false));
    driver.set_version(3, false).await.unwrap();
    assert_eq!(driver.version().await.unwrap(), MigrationState::new(3, false));
    assert_eq!(
        store.object(STATE_KEY).unwrap().body,
        br#"{"version":3,"dirty":false}"#
    );
}

#[test]
fn test_statements_keep_their_order() {
    let body = br#"[
        {"action":"UPLOAD","path":"/media/intro.mp4","filename":"intro.mp4"},
        {"action":"DELETE","filename":"old-intro.mp4"}
    ]"#;
    let statements = parse_statements(body).unwrap();
    let actions: Vec<Action> = statements.iter().map(Statement::action).collect();
    assert_eq!(actions, vec![Action::Upload, Action::Delete]);
    assert_eq!(
        statements[0],
        Statement::Upload {
            path: "/media/intro.mp4".into(),
            filename: "intro.mp4".into(),
        }
    );
}

#[tokio::test]
async fn test_directory_migrations_with_env() {
    let assets = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(assets.path().join("videos")).unwrap();
    std::fs::write(assets.path().join("videos/intro.mp4"), b"frames").unwrap();
    std::fs::write(assets.path().join("videos/intro.srt"), b"1\nhello").unwrap();

    let migrations = tempfile::tempdir().unwrap();
    std::fs::write(
        migrations.path().join("1_intro.up.json"),
        r#"[{"action":"UPLOAD","path":"/videos/intro.mp4","filename":"${STAGE}/intro.mp4"}]"#,
    )
    .unwrap();
    std::fs::write(
        migrations.path().join("1_intro.down.json"),
        r#"[{"action":"DELETE","filename":"${STAGE}/intro.mp4"}]"#,
    )
    .unwrap();
    std::fs::write(
        migrations.path().join("2_subtitles.up.json"),
        r#"[{"action":"UPLOAD","path":"/videos/intro.srt","filename":"${STAGE:-dev}/intro.srt"}]"#,
    )
    .unwrap();
    std::fs::write(
        migrations.path().join("2_subtitles.down.json"),
        r#"[{"action":"DELETE","filename":"${STAGE:-dev}/intro.srt"}]"#,
    )
    .unwrap();

    let store = MemoryObjectStore::new("media");
    let driver = S3Driver::open(store.clone(), DirAssets::new(assets.path()))
        .await
        .unwrap();
    let source = EnvExpandingSource::with_env(
        DirSource::open(migrations.path()).await.unwrap(),
        MapEnv::new().set("STAGE", "qa"),
    );
    let migrator = Migrator::new(driver, source);

    assert_eq!(migrator.up().await.unwrap(), vec![1, 2]);
    assert_eq!(migrator.version().await.unwrap(), MigrationState::new(2, false));

    let video = store.object("qa/intro.mp4").unwrap();
    assert_eq!(video.body, b"frames");
    assert_eq!(video.metadata["Extension"], ".mp4");
    let subtitles = store.object("qa/intro.srt").unwrap();
    assert_eq!(subtitles.body, b"1\nhello");
    assert_eq!(subtitles.metadata["Extension"], ".srt");

    assert_eq!(migrator.down().await.unwrap(), vec![2, 1]);
    assert_eq!(store.keys(), vec![STATE_KEY.to_string()]);
}

#[tokio::test]
async fn test_asset_outside_root_is_rejected() {
    let assets = tempfile::tempdir().unwrap();
    let store = MemoryObjectStore::new("media");
    let driver = S3Driver::open(store.clone(), DirAssets::new(assets.path()))
        .await
        .unwrap();

    let err = driver
        .run(br#"[{"action":"UPLOAD","path":"../secret","filename":"x"}]"#)
        .await
        .unwrap_err();
    assert!(matches!(err, MigrationError::Asset { .. }));
    assert!(!store.head_object("x").await.unwrap());
}
