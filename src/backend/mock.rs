//! Scripted in-memory backend for tests.

use super::{Backend, BackendReply, CompareRequest, UploadFile};
use crate::error::{BenchError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

struct Scripted {
    reply: Result<BackendReply>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Replies are served in the order they were pushed. A gated reply is held
/// until its sender fires (or is dropped).
#[derive(Default)]
pub(crate) struct MockBackend {
    uploads: Mutex<VecDeque<Scripted>>,
    compares: Mutex<VecDeque<Scripted>>,
    upload_calls: AtomicUsize,
    compare_calls: AtomicUsize,
    requests: Mutex<Vec<CompareRequest>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_upload(&self, reply: Result<BackendReply>) {
        self.uploads.lock().unwrap().push_back(Scripted { reply, gate: None });
    }

    pub(crate) fn push_upload_gated(&self, reply: Result<BackendReply>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.uploads.lock().unwrap().push_back(Scripted {
            reply,
            gate: Some(rx),
        });
        tx
    }

    pub(crate) fn push_compare(&self, reply: Result<BackendReply>) {
        self.compares.lock().unwrap().push_back(Scripted { reply, gate: None });
    }

    pub(crate) fn push_compare_gated(&self, reply: Result<BackendReply>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.compares.lock().unwrap().push_back(Scripted {
            reply,
            gate: Some(rx),
        });
        tx
    }

    pub(crate) fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn compare_calls(&self) -> usize {
        self.compare_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn compare_requests(&self) -> Vec<CompareRequest> {
        self.requests.lock().unwrap().clone()
    }

    async fn serve(queue: &Mutex<VecDeque<Scripted>>) -> Result<BackendReply> {
        let next = queue.lock().unwrap().pop_front();
        let Some(scripted) = next else {
            return Err(BenchError::Http("no scripted reply".to_string()));
        };
        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.reply
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn upload(&self, _file: &UploadFile) -> Result<BackendReply> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        Self::serve(&self.uploads).await
    }

    async fn compare(&self, request: &CompareRequest) -> Result<BackendReply> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Self::serve(&self.compares).await
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}
