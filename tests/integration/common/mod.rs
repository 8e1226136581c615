//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use url::Url;
use url_insight::analyzer::{build_http_client, AnalyzeError, LinkProber, PageAnalyzer};
use url_insight::config::UserAgentConfig;
use url_insight::model::{
    AnalysisResult, HeadingCounts, Link, StoredAnalysis, StoredLink, TaskId, UrlRecord, UrlStatus,
};
use url_insight::storage::{RecordStore, SqliteStorage, StorageError, StorageResult};
use url_insight::{HttpPageAnalyzer, PoolConfig};
use wiremock::ResponseTemplate;

/// Point at which `RecordingStore` simulates a caller stopping a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPoint {
    /// Right after the worker has read the record
    AfterLoad,
    /// Right before the worker commits its results
    BeforeCommit,
}

/// SQLite store that remembers every status write
pub struct RecordingStore {
    inner: SqliteStorage,
    history: Mutex<Vec<(TaskId, UrlStatus)>>,
    fail_saves: AtomicBool,
    armed_stop: Mutex<Option<StopPoint>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStorage::open_in_memory().expect("in-memory database"),
            history: Mutex::new(Vec::new()),
            fail_saves: AtomicBool::new(false),
            armed_stop: Mutex::new(None),
        }
    }

    /// Stops the next record that reaches `point`, once
    pub fn stop_at(&self, point: StopPoint) {
        *self.armed_stop.lock().unwrap() = Some(point);
    }

    fn interfere(&self, id: TaskId, point: StopPoint) {
        let mut armed = self.armed_stop.lock().unwrap();
        if *armed == Some(point) {
            *armed = None;
            self.set_status(id, UrlStatus::Stopped).unwrap();
        }
    }

    fn record(&self, id: TaskId, status: UrlStatus) {
        self.history.lock().unwrap().push((id, status));
    }

    /// Makes every following batch save fail
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    /// Statuses written for `id`, in write order
    pub fn statuses(&self, id: TaskId) -> Vec<UrlStatus> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(task, _)| *task == id)
            .map(|(_, status)| *status)
            .collect()
    }
}

impl RecordStore for RecordingStore {
    fn load(&self, id: TaskId) -> StorageResult<UrlRecord> {
        let record = self.inner.load(id)?;
        self.interfere(id, StopPoint::AfterLoad);
        Ok(record)
    }

    fn set_status(&self, id: TaskId, status: UrlStatus) -> StorageResult<()> {
        self.inner.set_status(id, status)?;
        self.record(id, status);
        Ok(())
    }

    fn save_analysis_batch(
        &self,
        id: TaskId,
        result: &AnalysisResult,
        links: &[Link],
    ) -> StorageResult<i64> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Database("disk full".to_string()));
        }
        self.inner.save_analysis_batch(id, result, links)
    }

    fn transition_status(
        &self,
        id: TaskId,
        from: &[UrlStatus],
        to: UrlStatus,
    ) -> StorageResult<bool> {
        let changed = self.inner.transition_status(id, from, to)?;
        if changed {
            self.record(id, to);
        }
        Ok(changed)
    }

    fn complete_analysis(
        &self,
        id: TaskId,
        result: &AnalysisResult,
        links: &[Link],
    ) -> StorageResult<Option<i64>> {
        self.interfere(id, StopPoint::BeforeCommit);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Database("disk full".to_string()));
        }
        let saved = self.inner.complete_analysis(id, result, links)?;
        if saved.is_some() {
            self.record(id, UrlStatus::Done);
        }
        Ok(saved)
    }

    fn create_url(&self, address: &str) -> StorageResult<TaskId> {
        self.inner.create_url(address)
    }

    fn list_urls(&self) -> StorageResult<Vec<UrlRecord>> {
        self.inner.list_urls()
    }

    fn analysis_results(&self, id: TaskId) -> StorageResult<Vec<StoredAnalysis>> {
        self.inner.analysis_results(id)
    }

    fn links(&self, id: TaskId) -> StorageResult<Vec<StoredLink>> {
        self.inner.links(id)
    }
}

pub fn result_titled(title: &str) -> AnalysisResult {
    AnalysisResult {
        html_version: "HTML 5".to_string(),
        title: title.to_string(),
        headings: HeadingCounts {
            h1: 1,
            ..Default::default()
        },
        has_login_form: false,
    }
}

/// Succeeds after `delay` with one internal link, or fails for paths containing "fail"
pub struct ScriptedAnalyzer {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, address: &Url) -> Result<(AnalysisResult, Vec<Link>), AnalyzeError> {
        let run = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;

        if address.path().contains("fail") {
            return Err(AnalyzeError::HttpStatus {
                url: address.to_string(),
                status: 500,
            });
        }

        Ok((
            result_titled(&format!("run {}", run)),
            vec![Link {
                href: format!("{}#run{}", address, run),
                is_external: false,
                status_code: 200,
            }],
        ))
    }
}

/// Blocks every analysis until the test hands out a permit
pub struct GatedAnalyzer {
    pub started: Notify,
    pub release: Semaphore,
}

impl GatedAnalyzer {
    pub fn new() -> Self {
        Self {
            started: Notify::new(),
            release: Semaphore::new(0),
        }
    }

    pub fn release_all(&self) {
        self.release.add_permits(1_000);
    }
}

#[async_trait]
impl PageAnalyzer for GatedAnalyzer {
    async fn analyze(&self, _address: &Url) -> Result<(AnalysisResult, Vec<Link>), AnalyzeError> {
        self.started.notify_one();
        if let Ok(permit) = self.release.acquire().await {
            permit.forget();
        }
        Ok((result_titled("gated"), vec![]))
    }
}

pub struct PanickingAnalyzer;

#[async_trait]
impl PageAnalyzer for PanickingAnalyzer {
    async fn analyze(&self, _address: &Url) -> Result<(AnalysisResult, Vec<Link>), AnalyzeError> {
        panic!("analyzer bug");
    }
}

pub fn pool_config(workers: usize, queue_capacity: usize, task_timeout: Duration) -> PoolConfig {
    PoolConfig {
        workers,
        queue_capacity,
        task_timeout,
    }
}

pub fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    }
}

/// Real reqwest-backed analyzer with short timeouts
pub fn http_analyzer() -> HttpPageAnalyzer {
    let client = build_http_client(&test_user_agent(), Duration::from_secs(10))
        .expect("Failed to build client");
    let prober = LinkProber::new(client.clone(), 4, Duration::from_secs(2));
    HttpPageAnalyzer::new(client, prober)
}

pub fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

/// Waits until `id` reaches a terminal status or the deadline passes
pub async fn wait_for_terminal(store: &Arc<dyn RecordStore>, id: TaskId) -> UrlStatus {
    for _ in 0..200 {
        let status = store.load(id).expect("record exists").status;
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("task {} never reached a terminal status", id);
}
