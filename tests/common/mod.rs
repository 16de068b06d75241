//! Test executors shared by the registry tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{watch, Notify};

use partition_registry::partition::{
    DdlEvent, ExecutorError, RecordingExecutor, SchemaExecutor, SchemaInstruction,
};

/// Records instructions, but holds every dependency emission until the gate
/// is opened.
pub struct GatedExecutor {
    inner: RecordingExecutor,
    gate: watch::Sender<bool>,
    pub entered: Notify,
    calls: AtomicUsize,
}

impl GatedExecutor {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            inner: RecordingExecutor::new(),
            gate,
            entered: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Number of dependency emissions started, including blocked ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn instructions(&self) -> Vec<SchemaInstruction> {
        self.inner.instructions()
    }

    pub fn ddl_count(&self) -> usize {
        self.inner.ddl_count()
    }
}

#[async_trait]
impl SchemaExecutor for GatedExecutor {
    async fn emit_dependency(&self, child: &str, parent: &str) -> Result<(), ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let mut rx = self.gate.subscribe();
        if rx.wait_for(|open| *open).await.is_err() {
            return Err(ExecutorError::Rejected("gate closed".to_string()));
        }
        self.inner.emit_dependency(child, parent).await
    }

    async fn emit_deferred_ddl(&self, event: DdlEvent, statement: &str) -> Result<(), ExecutorError> {
        self.inner.emit_deferred_ddl(event, statement).await
    }
}

/// Rejects every dependency, optionally after a pause.
#[derive(Default)]
pub struct FailingExecutor {
    calls: AtomicUsize,
    delay: Option<std::time::Duration>,
}

impl FailingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaExecutor for FailingExecutor {
    async fn emit_dependency(&self, child: &str, parent: &str) -> Result<(), ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(ExecutorError::DependencyUnsatisfied {
            child: child.to_string(),
            parent: parent.to_string(),
        })
    }

    async fn emit_deferred_ddl(&self, _event: DdlEvent, _statement: &str) -> Result<(), ExecutorError> {
        Ok(())
    }
}

/// Fails the first `failures` dependency emissions, then records normally.
pub struct FlakyExecutor {
    inner: RecordingExecutor,
    remaining: AtomicUsize,
}

impl FlakyExecutor {
    pub fn new(failures: usize) -> Self {
        Self {
            inner: RecordingExecutor::new(),
            remaining: AtomicUsize::new(failures),
        }
    }

    pub fn ddl_count(&self) -> usize {
        self.inner.ddl_count()
    }
}

#[async_trait]
impl SchemaExecutor for FlakyExecutor {
    async fn emit_dependency(&self, child: &str, parent: &str) -> Result<(), ExecutorError> {
        let failed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ExecutorError::Rejected(format!("{} not yet creatable", child)));
        }
        self.inner.emit_dependency(child, parent).await
    }

    async fn emit_deferred_ddl(&self, event: DdlEvent, statement: &str) -> Result<(), ExecutorError> {
        self.inner.emit_deferred_ddl(event, statement).await
    }
}
