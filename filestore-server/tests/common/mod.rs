//! In-memory repository stub shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use filestore_server::admission::{AdmissionController, AdmissionLimits};
use filestore_server::db::{FileRepository, RepoResult, StoreError};
use filestore_server::models::{File, FileTimestamps};
use filestore_server::FileService;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub const TEST_UPLOAD_LIMIT: usize = 1024 * 1024;

/// Repository stub that records how many calls run at once.
#[derive(Default)]
pub struct MemoryRepository {
    files: Mutex<Vec<File>>,
    delay: Option<Duration>,
    failure: Mutex<Option<StoreError>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` before touching the data.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Every subsequent call fails with `err`.
    pub fn fail_with(&self, err: StoreError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    async fn enter(&self) -> RepoResult<InFlight<'_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(guard),
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileRepository for MemoryRepository {
    async fn create(&self, file: &mut File) -> RepoResult<()> {
        let _guard = self.enter().await?;
        let now = Utc::now();
        file.id = uuid::Uuid::new_v4().to_string();
        file.created_at = now;
        file.updated_at = now;
        self.files.lock().unwrap().push(file.clone());
        Ok(())
    }

    async fn find_all(&self) -> RepoResult<Vec<File>> {
        let _guard = self.enter().await?;
        Ok(self.files.lock().unwrap().clone())
    }

    async fn find_one(&self, id: &str) -> RepoResult<Option<File>> {
        let _guard = self.enter().await?;
        Ok(self.files.lock().unwrap().iter().find(|f| f.id == id).cloned())
    }

    async fn update(&self, file: &File) -> RepoResult<Option<FileTimestamps>> {
        let _guard = self.enter().await?;
        let mut files = self.files.lock().unwrap();
        Ok(files.iter_mut().find(|f| f.id == file.id).map(|stored| {
            stored.name = file.name.clone();
            stored.data = file.data.clone();
            stored.updated_at = Utc::now().max(stored.created_at);
            FileTimestamps {
                created_at: stored.created_at,
                updated_at: stored.updated_at,
            }
        }))
    }

    async fn delete(&self, id: &str) -> RepoResult<Vec<String>> {
        let _guard = self.enter().await?;
        let mut files = self.files.lock().unwrap();
        let before = files.len();
        files.retain(|f| f.id != id);
        Ok(if files.len() < before {
            vec![id.to_string()]
        } else {
            Vec::new()
        })
    }
}

/// Service over `repo` with the production admission capacities.
pub fn service(repo: Arc<MemoryRepository>) -> FileService {
    service_with_limits(repo, AdmissionLimits::DEFAULT)
}

pub fn service_with_limits(repo: Arc<MemoryRepository>, limits: AdmissionLimits) -> FileService {
    FileService::with_admission(repo, AdmissionController::new(limits), TEST_UPLOAD_LIMIT)
}

/// Records `(level, message)` of every event while installed.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    /// Install as the thread's default subscriber until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0.lock().unwrap().push((*event.metadata().level(), visitor.0));
    }
}
