use assert_matches::assert_matches;
use chrono::Utc;
use sqlx::PgPool;
use vocalis_core::error::CoreError;
use vocalis_core::jobs::{JobManager, JobOutcome, NewJob};
use vocalis_core::results::{ResultRow, ResultTable, SaResult, SttResult};
use vocalis_core::store::{Store, StoreError, StoreScope};
use vocalis_core::types::DbId;
use vocalis_db::PgStore;

/// Registers `stt` (1001) and `sa` (1002).
async fn seed_models(scope: &mut dyn StoreScope) {
    scope.insert_model("stt").await.unwrap();
    scope.insert_model("sa").await.unwrap();
}

async fn seed_job(scope: &mut dyn StoreScope, model_id: DbId, correlation_id: &str) -> DbId {
    scope
        .insert_job(&NewJob {
            model_id,
            correlation_id: correlation_id.into(),
            file_name: "a.wav".into(),
            transaction: "reply".into(),
            message: "in progress".into(),
        })
        .await
        .unwrap()
        .id
}

fn stt_row(job_id: i64, model_id: i64, correlation_id: &str) -> ResultRow {
    let now = Utc::now();
    ResultRow::Stt(SttResult {
        job_id,
        model_id,
        correlation_id: correlation_id.into(),
        transcription: "{selamat pagi}".into(),
        audio_duration: 0.25,
        start_time: now,
        finish_time: now,
        stt_duration: 0.01,
        inserted_at: now,
    })
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_model_ids_start_at_1001(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut scope = store.scope().await.unwrap();

    let stt = scope.insert_model("stt").await.unwrap();
    let sa = scope.insert_model("sa").await.unwrap();
    assert_eq!(stt.id, 1001);
    assert_eq!(sa.id, 1002);

    let listed = scope.list_models().await.unwrap();
    assert_eq!(listed, vec![stt, sa]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_duplicate_model_name_is_conflict(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut scope = store.scope().await.unwrap();

    scope.insert_model("stt").await.unwrap();
    assert_matches!(scope.insert_model("stt").await, Err(StoreError::Conflict(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_job_completes_only_once(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut scope = store.scope().await.unwrap();
    seed_models(scope.as_mut()).await;

    let job = JobManager::create(scope.as_mut(), 1001, "abc123", "call.wav")
        .await
        .unwrap();
    assert!(!job.complete);
    assert_eq!(job.message.as_deref(), Some("in progress"));

    JobManager::mark_terminal(scope.as_mut(), job.id, &JobOutcome::Success)
        .await
        .unwrap();
    let err = JobManager::mark_terminal(scope.as_mut(), job.id, &JobOutcome::Failure("x".into()))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    let stored = scope.find_job(job.id).await.unwrap().unwrap();
    assert!(stored.complete);
    assert_eq!(stored.message.as_deref(), Some("successful"));
    assert!(stored.updated_at >= job.updated_at);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_jobs_listed_by_model_and_correlation(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut scope = store.scope().await.unwrap();
    seed_models(scope.as_mut()).await;

    for (model_id, correlation_id) in [(1001, "abc"), (1001, "abc"), (1002, "abc"), (1001, "x")] {
        seed_job(scope.as_mut(), model_id, correlation_id).await;
    }

    let jobs = scope.list_jobs(1001, "abc").await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs[0].id < jobs[1].id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_results_are_keyed_by_job_and_model(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut scope = store.scope().await.unwrap();
    seed_models(scope.as_mut()).await;
    let job_id = seed_job(scope.as_mut(), 1001, "abc").await;

    scope.insert_result(&stt_row(job_id, 1001, "abc")).await.unwrap();
    scope.insert_result(&stt_row(job_id, 1002, "abc")).await.unwrap();
    assert_matches!(
        scope.insert_result(&stt_row(job_id, 1001, "abc")).await,
        Err(StoreError::Conflict(_))
    );

    let rows = scope.list_results(ResultTable::Stt, 1001, "abc").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].model_id(), 1001);
    assert!(scope
        .list_results(ResultTable::Sa, 1001, "abc")
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_sa_rows_round_trip(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut scope = store.scope().await.unwrap();
    seed_models(scope.as_mut()).await;
    let job_id = seed_job(scope.as_mut(), 1002, "abc").await;
    let now = Utc::now();

    let row = ResultRow::Sa(SaResult {
        job_id,
        model_id: 1002,
        correlation_id: "abc".into(),
        emotion_result: "neutral".into(),
        confidence_value: 0.87,
        audio_duration: 0.12,
        start_time: now,
        finish_time: now,
        sa_duration: 0.02,
        inserted_at: now,
    });
    scope.insert_result(&row).await.unwrap();

    let rows = scope.list_results(ResultTable::Sa, 1002, "abc").await.unwrap();
    let [ResultRow::Sa(stored)] = rows.as_slice() else {
        panic!("expected one sa row, got {rows:?}");
    };
    assert_eq!(stored.emotion_result, "neutral");
    assert_eq!(stored.confidence_value, 0.87);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_rows_must_reference_existing_parents(pool: PgPool) {
    let store = PgStore::new(pool);
    let mut scope = store.scope().await.unwrap();
    seed_models(scope.as_mut()).await;

    let orphan_job = NewJob {
        model_id: 4242,
        correlation_id: "abc".into(),
        file_name: "a.wav".into(),
        transaction: "reply".into(),
        message: "in progress".into(),
    };
    assert_matches!(scope.insert_job(&orphan_job).await, Err(StoreError::Backend(_)));

    assert_matches!(
        scope.insert_result(&stt_row(99, 1001, "abc")).await,
        Err(StoreError::Backend(_))
    );

    let job_id = seed_job(scope.as_mut(), 1001, "abc").await;
    assert_matches!(
        scope.insert_result(&stt_row(job_id, 4242, "abc")).await,
        Err(StoreError::Backend(_))
    );
    assert!(scope
        .list_results(ResultTable::Stt, 1001, "abc")
        .await
        .unwrap()
        .is_empty());
}
