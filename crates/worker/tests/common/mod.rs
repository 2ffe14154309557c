//! Shared fixtures for worker tests: an in-memory store, two registered
//! models and stub inference backends.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};
use vocalis_core::audio::silent_wav;
use vocalis_core::capability::params::{PARAM_AUDIO_CONTENTS, PARAM_AUDIO_FORMAT, PARAM_LANGUAGE};
use vocalis_core::capability::{CapabilityContext, CapabilityKind, CapabilityParams};
use vocalis_core::inference::{
    ClassificationRequest, InferenceBackend, InferenceError, TranscriptionRequest,
};
use vocalis_core::jobs::{Job, JobManager, NewJob};
use vocalis_core::models::Model;
use vocalis_core::registry::{CapabilityDescriptor, CapabilityRegistry};
use vocalis_core::resolver::CapabilityResolver;
use vocalis_core::results::{ResultRow, ResultTable};
use vocalis_core::store::{MemoryStore, Store, StoreError, StoreScope};
use vocalis_core::types::DbId;
use vocalis_worker::{ExecutionTask, JobExecutor};

/// Echoes the language hint back as the transcription and prefers "happy".
pub struct EchoBackend;

#[async_trait]
impl InferenceBackend for EchoBackend {
    async fn transcribe(&self, req: &TranscriptionRequest) -> Result<String, InferenceError> {
        Ok(format!("lang {}", req.language))
    }

    async fn classify(&self, _req: &ClassificationRequest) -> Result<Vec<f32>, InferenceError> {
        Ok(vec![0.0, 0.0, 4.0, 0.0, 0.0, 0.0])
    }
}

/// Every call fails with a server error.
pub struct FailingBackend;

#[async_trait]
impl InferenceBackend for FailingBackend {
    async fn transcribe(&self, _req: &TranscriptionRequest) -> Result<String, InferenceError> {
        Err(InferenceError::Server {
            status: 500,
            body: "CUDA out of memory".into(),
        })
    }

    async fn classify(&self, _req: &ClassificationRequest) -> Result<Vec<f32>, InferenceError> {
        Err(InferenceError::Transport("connection reset".into()))
    }
}

/// Panics inside the handler.
pub struct PanickingBackend;

#[async_trait]
impl InferenceBackend for PanickingBackend {
    async fn transcribe(&self, _req: &TranscriptionRequest) -> Result<String, InferenceError> {
        panic!("decoder exploded")
    }

    async fn classify(&self, _req: &ClassificationRequest) -> Result<Vec<f32>, InferenceError> {
        panic!("decoder exploded")
    }
}

/// Signals `started` on each call, then blocks until `release` has a permit.
pub struct GatedBackend {
    pub started: Notify,
    pub release: Semaphore,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self {
            started: Notify::new(),
            release: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl InferenceBackend for GatedBackend {
    async fn transcribe(&self, _req: &TranscriptionRequest) -> Result<String, InferenceError> {
        self.started.notify_one();
        let _permit = self
            .release
            .acquire()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        Ok("halo".into())
    }

    async fn classify(&self, _req: &ClassificationRequest) -> Result<Vec<f32>, InferenceError> {
        Ok(vec![1.0])
    }
}

/// Wraps a [`MemoryStore`], failing the first `scope_failures` calls to
/// `scope()` and the first `complete_failures` calls to `complete_job`.
pub struct FlakyStore {
    inner: MemoryStore,
    scope_failures: AtomicUsize,
    complete_failures: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, scope_failures: usize, complete_failures: usize) -> Self {
        Self {
            inner,
            scope_failures: AtomicUsize::new(scope_failures),
            complete_failures: Arc::new(AtomicUsize::new(complete_failures)),
        }
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn pool_timeout() -> StoreError {
    StoreError::backend(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        "pool timed out while waiting for an open connection",
    ))
}

#[async_trait]
impl Store for FlakyStore {
    async fn scope(&self) -> Result<Box<dyn StoreScope>, StoreError> {
        if take_failure(&self.scope_failures) {
            return Err(pool_timeout());
        }
        Ok(Box::new(FlakyScope {
            inner: self.inner.scope().await?,
            complete_failures: Arc::clone(&self.complete_failures),
        }))
    }
}

struct FlakyScope {
    inner: Box<dyn StoreScope>,
    complete_failures: Arc<AtomicUsize>,
}

#[async_trait]
impl StoreScope for FlakyScope {
    async fn ping(&mut self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn insert_model(&mut self, name: &str) -> Result<Model, StoreError> {
        self.inner.insert_model(name).await
    }

    async fn find_model(&mut self, id: DbId) -> Result<Option<Model>, StoreError> {
        self.inner.find_model(id).await
    }

    async fn list_models(&mut self) -> Result<Vec<Model>, StoreError> {
        self.inner.list_models().await
    }

    async fn insert_job(&mut self, job: &NewJob) -> Result<Job, StoreError> {
        self.inner.insert_job(job).await
    }

    async fn find_job(&mut self, id: DbId) -> Result<Option<Job>, StoreError> {
        self.inner.find_job(id).await
    }

    async fn list_jobs(
        &mut self,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<Job>, StoreError> {
        self.inner.list_jobs(model_id, correlation_id).await
    }

    async fn complete_job(&mut self, id: DbId, message: &str) -> Result<bool, StoreError> {
        if take_failure(&self.complete_failures) {
            return Err(pool_timeout());
        }
        self.inner.complete_job(id, message).await
    }

    async fn insert_result(&mut self, row: &ResultRow) -> Result<(), StoreError> {
        self.inner.insert_result(row).await
    }

    async fn list_results(
        &mut self,
        table: ResultTable,
        model_id: DbId,
        correlation_id: &str,
    ) -> Result<Vec<ResultRow>, StoreError> {
        self.inner.list_results(table, model_id, correlation_id).await
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub resolver: Arc<CapabilityResolver>,
    pub stt_id: DbId,
    pub sa_id: DbId,
}

impl Harness {
    /// Registry with `stt` (no language in its allow-list) and `sa`;
    /// both names registered in the store.
    pub async fn new() -> Self {
        let registry = CapabilityRegistry::from_descriptors([
            CapabilityDescriptor {
                name: "stt".into(),
                capability: CapabilityKind::SpeechToText,
                params: vec![PARAM_AUDIO_CONTENTS.into(), PARAM_AUDIO_FORMAT.into()],
                output_table: ResultTable::Stt,
                output_columns: vec![
                    "job_id".into(),
                    "correlation_id".into(),
                    "transcription".into(),
                    "audio_duration".into(),
                ],
            },
            CapabilityDescriptor {
                name: "sa".into(),
                capability: CapabilityKind::StressAnalysis,
                params: vec![PARAM_AUDIO_CONTENTS.into(), PARAM_AUDIO_FORMAT.into()],
                output_table: ResultTable::Sa,
                output_columns: vec![
                    "job_id".into(),
                    "emotion_result".into(),
                    "confidence_value".into(),
                ],
            },
        ])
        .unwrap();

        let store = MemoryStore::new();
        let mut scope = store.scope().await.unwrap();
        let stt_id = scope.insert_model("stt").await.unwrap().id;
        let sa_id = scope.insert_model("sa").await.unwrap().id;

        Self {
            store,
            resolver: Arc::new(CapabilityResolver::new(Arc::new(registry))),
            stt_id,
            sa_id,
        }
    }

    pub fn executor(&self, backend: Arc<dyn InferenceBackend>) -> Arc<JobExecutor> {
        self.executor_over(Arc::new(self.store.clone()), backend)
    }

    /// Executor over a different view of the harness store.
    pub fn executor_over(
        &self,
        store: Arc<dyn Store>,
        backend: Arc<dyn InferenceBackend>,
    ) -> Arc<JobExecutor> {
        Arc::new(JobExecutor::new(
            store,
            Arc::clone(&self.resolver),
            CapabilityContext::new(backend),
        ))
    }

    /// Create a job row and the task that runs it with a one-second clip.
    pub async fn task(&self, model_id: DbId, correlation_id: &str) -> ExecutionTask {
        let mut scope = self.store.scope().await.unwrap();
        let job = JobManager::create(scope.as_mut(), model_id, correlation_id, "call.wav")
            .await
            .unwrap();
        ExecutionTask {
            job_id: job.id,
            model_id,
            correlation_id: correlation_id.into(),
            params: audio_params().with_text(PARAM_LANGUAGE, "en"),
        }
    }

    pub async fn job(&self, job_id: DbId) -> Job {
        let mut scope = self.store.scope().await.unwrap();
        scope.find_job(job_id).await.unwrap().unwrap()
    }

    /// Poll until the job is complete.
    pub async fn wait_complete(&self, job_id: DbId) -> Job {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let job = self.job(job_id).await;
                if job.complete {
                    return job;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("job {job_id} did not complete"))
    }
}

pub fn audio_params() -> CapabilityParams {
    CapabilityParams::new()
        .with_bytes(PARAM_AUDIO_CONTENTS, silent_wav(16_000, 16_000))
        .with_text(PARAM_AUDIO_FORMAT, "wav")
}
