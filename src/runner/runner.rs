//! Parallel Test Runner
//!
//! Discovers `test` blocks across script files and runs each one as an
//! isolated unit on a bounded worker pool:
//! - every unit (and every retry) gets a fresh interpreter and a fresh
//!   session from the [`SessionFactory`]
//! - a file that fails to parse contributes one error result and never
//!   reaches the pool
//! - results are appended to a shared collector and ordered by file and
//!   test name in the summary

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;

use crate::ast::types::ScriptNode;
use crate::browser::fake::FakeBrowser;
use crate::browser::session::SyncSession;
use crate::commands::types::Session;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::executor::Executor;
use crate::interpreter::types::ExecutionLimits;
use crate::runner::types::{RunSummary, RunnerError, TestResult, TestStatus};

/// Creates one fresh session per test attempt.
pub trait SessionFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Session + Send>, RunnerError>;
}

/// Factory producing [`FakeBrowser`]-backed sessions, optionally seeded
/// with a page-model setup closure.
pub struct FakeSessionFactory {
    setup: Option<Arc<dyn Fn(&FakeBrowser) + Send + Sync>>,
}

impl FakeSessionFactory {
    pub fn new() -> Self {
        Self { setup: None }
    }

    pub fn with_setup(setup: impl Fn(&FakeBrowser) + Send + Sync + 'static) -> Self {
        Self {
            setup: Some(Arc::new(setup)),
        }
    }
}

impl Default for FakeSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFactory for FakeSessionFactory {
    fn create(&self) -> Result<Box<dyn Session + Send>, RunnerError> {
        let browser = Arc::new(FakeBrowser::new());
        if let Some(setup) = &self.setup {
            setup(&browser);
        }
        let handle = tokio::runtime::Handle::try_current().map_err(|e| RunnerError::Session {
            reason: e.to_string(),
        })?;
        Ok(Box::new(SyncSession::new(browser, handle)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    /// Maximum tests running at once.
    pub workers: usize,
    /// Retries per test after a failed attempt.
    pub retries: u32,
    pub limits: ExecutionLimits,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            retries: 0,
            limits: ExecutionLimits::default(),
        }
    }
}

/// One schedulable unit: a named `test` block, or a whole script when the
/// file declares no tests.
struct TestUnit {
    file: String,
    name: String,
    script: Arc<ScriptNode>,
    is_test: bool,
}

pub struct Runner {
    factory: Arc<dyn SessionFactory>,
    options: RunnerOptions,
}

impl Runner {
    pub fn new(factory: Arc<dyn SessionFactory>, options: RunnerOptions) -> Self {
        Self { factory, options }
    }

    /// Run every test across the given files.
    pub async fn run_files(&self, files: &[PathBuf]) -> Result<RunSummary, RunnerError> {
        let started = Instant::now();
        let mut units = Vec::new();
        let mut results = Vec::new();

        for path in files {
            let source =
                std::fs::read_to_string(path).map_err(|source| RunnerError::ReadFile {
                    path: path.display().to_string(),
                    source,
                })?;
            let file = path.display().to_string();
            collect_units(&file, &source, &mut units, &mut results);
        }

        self.run_units(units, results, started).await
    }

    /// Run a single in-memory source under the given display name.
    pub async fn run_source(&self, name: &str, source: &str) -> Result<RunSummary, RunnerError> {
        let started = Instant::now();
        let mut units = Vec::new();
        let mut results = Vec::new();
        collect_units(name, source, &mut units, &mut results);
        self.run_units(units, results, started).await
    }

    async fn run_units(
        &self,
        units: Vec<TestUnit>,
        parse_results: Vec<TestResult>,
        started: Instant,
    ) -> Result<RunSummary, RunnerError> {
        let semaphore = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let collector = Arc::new(Mutex::new(parse_results));
        let mut handles = Vec::with_capacity(units.len());

        for unit in units {
            let semaphore = semaphore.clone();
            let collector = collector.clone();
            let factory = self.factory.clone();
            let options = self.options;

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.map_err(|e| RunnerError::Pool {
                    reason: e.to_string(),
                })?;
                let result = run_unit(factory.as_ref(), &unit, options)?;
                let mut collector = collector.lock().unwrap_or_else(|e| e.into_inner());
                collector.push(result);
                Ok::<(), RunnerError>(())
            }));
        }

        for handle in handles {
            handle
                .await
                .map_err(|e| RunnerError::Pool {
                    reason: e.to_string(),
                })??;
        }

        let results = match Arc::try_unwrap(collector) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(|e| e.into_inner()),
            Err(shared) => shared.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        };
        Ok(RunSummary::from_results(
            results,
            started.elapsed().as_millis() as u64,
        ))
    }
}

/// Parse one file into test units. A file with diagnostics contributes one
/// error result instead of units; a file with no `test` blocks runs whole.
fn collect_units(
    file: &str,
    source: &str,
    units: &mut Vec<TestUnit>,
    results: &mut Vec<TestResult>,
) {
    let parsed = crate::parser::parse(source);
    if !parsed.errors.is_empty() {
        let message = parsed
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        results.push(TestResult {
            name: file_stem(file),
            file: file.to_string(),
            status: TestStatus::Error,
            message: Some(message),
            duration_ms: 0,
            retries: 0,
            finished_at: Utc::now(),
        });
        return;
    }

    let script = Arc::new(parsed.script);
    let test_names = script.test_names();
    if test_names.is_empty() {
        units.push(TestUnit {
            file: file.to_string(),
            name: file_stem(file),
            script,
            is_test: false,
        });
        return;
    }
    for name in test_names {
        units.push(TestUnit {
            file: file.to_string(),
            name,
            script: script.clone(),
            is_test: true,
        });
    }
}

fn file_stem(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

/// Run one unit, retrying failed attempts from scratch.
fn run_unit(
    factory: &dyn SessionFactory,
    unit: &TestUnit,
    options: RunnerOptions,
) -> Result<TestResult, RunnerError> {
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        let mut session = factory.create()?;
        let outcome = tokio::task::block_in_place(|| {
            let mut executor = Executor::with_limits(session.as_mut(), options.limits);
            if unit.is_test {
                executor.run_test(&unit.script, &unit.name)
            } else {
                executor.run_script(&unit.script)
            }
        });

        match outcome {
            Ok(()) => {
                return Ok(TestResult {
                    name: unit.name.clone(),
                    file: unit.file.clone(),
                    status: TestStatus::Passed,
                    message: None,
                    duration_ms: started.elapsed().as_millis() as u64,
                    retries: attempt,
                    finished_at: Utc::now(),
                });
            }
            Err(_) if attempt < options.retries => {
                attempt += 1;
            }
            Err(err) => {
                let status = match &err {
                    RuntimeError::Assertion { .. } => TestStatus::Failed,
                    RuntimeError::TestFailed { assertion: true, .. } => TestStatus::Failed,
                    _ => TestStatus::Error,
                };
                return Ok(TestResult {
                    name: unit.name.clone(),
                    file: unit.file.clone(),
                    status,
                    message: Some(err.to_string()),
                    duration_ms: started.elapsed().as_millis() as u64,
                    retries: attempt,
                    finished_at: Utc::now(),
                });
            }
        }
    }
}
