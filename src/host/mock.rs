// src/host/mock.rs - In-memory host port for tests
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::HostPort;
use crate::transport::Adu;

#[derive(Default)]
struct Inner {
    lines_in: VecDeque<String>,
    frames_in: VecDeque<Adu>,
    lines_out: Vec<String>,
    frames_out: Vec<Adu>,
}

/// Scripted [`HostPort`]. Clones share state so a test can keep a handle
/// while the controller owns the boxed port.
#[derive(Clone, Default)]
pub struct MockHostPort {
    inner: Arc<Mutex<Inner>>,
}

impl MockHostPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&self, line: &str) {
        self.inner.lock().unwrap().lines_in.push_back(line.to_string());
    }

    pub fn push_frame(&self, adu: Adu) {
        self.inner.lock().unwrap().frames_in.push_back(adu);
    }

    pub fn lines_out(&self) -> Vec<String> {
        self.inner.lock().unwrap().lines_out.clone()
    }

    pub fn frames_out(&self) -> Vec<Adu> {
        self.inner.lock().unwrap().frames_out.clone()
    }
}

#[async_trait]
impl HostPort for MockHostPort {
    async fn poll_line(&mut self) -> Option<String> {
        self.inner.lock().unwrap().lines_in.pop_front()
    }

    async fn poll_frame(&mut self) -> Option<Adu> {
        self.inner.lock().unwrap().frames_in.pop_front()
    }

    async fn write_line(&mut self, line: &str) {
        self.inner.lock().unwrap().lines_out.push(line.to_string());
    }

    async fn send_frame(&mut self, adu: &Adu) {
        self.inner.lock().unwrap().frames_out.push(adu.clone());
    }
}
