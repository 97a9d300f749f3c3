// src/transport/mock.rs - Scripted in-memory transport for tests
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Adu, CommError, FrameTransport};

#[derive(Default)]
struct Inner {
    sent: Vec<Adu>,
    responses: VecDeque<Result<Adu, CommError>>,
    purges: usize,
}

/// In-memory [`FrameTransport`] that records every frame sent and serves
/// scripted responses in order. Clones share state, so a test can keep a
/// handle while the channel under test owns the boxed transport.
///
/// An empty response script behaves like a dead link: every receive
/// times out.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_response(&self, adu: Adu) {
        self.inner.lock().unwrap().responses.push_back(Ok(adu));
    }

    pub fn queue_error(&self, err: CommError) {
        self.inner.lock().unwrap().responses.push_back(Err(err));
    }

    /// Queue the echo response a drive produces for a write request.
    pub fn queue_echo_of_next_write(&self, unit: u8, function: u8, data: Vec<u8>) {
        self.queue_response(Adu::new(unit, function, data));
    }

    pub fn sent(&self) -> Vec<Adu> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn purge_count(&self) -> usize {
        self.inner.lock().unwrap().purges
    }

    pub fn clear_sent(&self) {
        self.inner.lock().unwrap().sent.clear();
    }
}

#[async_trait]
impl FrameTransport for MockTransport {
    async fn send(&mut self, adu: &Adu) {
        self.inner.lock().unwrap().sent.push(adu.clone());
    }

    async fn receive(&mut self) -> Result<Adu, CommError> {
        self.inner
            .lock()
            .unwrap()
            .responses
            .pop_front()
            .unwrap_or(Err(CommError::Timeout))
    }

    async fn purge(&mut self) {
        self.inner.lock().unwrap().purges += 1;
    }
}
