//! Scripted provider for proofreading tests.

#![allow(dead_code)]

use async_trait::async_trait;
use folio_core::{MemoryHandle, ProviderSession, RawFinding, RawMatch};
use folio_error::{FolioResult, ProviderError, ProviderErrorKind};
use folio_interface::ProviderAdapter;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted scan reply.
pub enum ScanReply {
    Items(Vec<RawMatch>),
    Malformed,
    Exhausted,
}

/// Provider that replays scan replies and rewrite texts in order.
pub struct MockProvider {
    name: String,
    scans: Mutex<VecDeque<ScanReply>>,
    rewrites: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scans: Mutex::new(VecDeque::new()),
            rewrites: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn scan(self, reply: ScanReply) -> Self {
        self.scans.lock().unwrap().push_back(reply);
        self
    }

    pub fn rewrite(self, text: &str) -> Self {
        self.rewrites.lock().unwrap().push_back(text.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

pub fn finding(matched: &str, sentence: &str, index: usize) -> RawMatch {
    RawMatch::Finding(RawFinding::new(matched, sentence, index))
}

pub fn as_providers(mocks: &[Arc<MockProvider>]) -> Vec<Arc<dyn ProviderAdapter>> {
    mocks
        .iter()
        .map(|m| Arc::clone(m) as Arc<dyn ProviderAdapter>)
        .collect()
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        "mock-1"
    }

    async fn open_session(&self, reference: &str) -> FolioResult<ProviderSession> {
        Ok(ProviderSession::new(&self.name, MemoryHandle::Transcript, reference))
    }

    async fn close_session(&self, _session: &ProviderSession) -> FolioResult<()> {
        Ok(())
    }

    async fn generate(&self, prompt: &str, _fragment_index: usize) -> FolioResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self
            .rewrites
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "Rewritten.".to_string()))
    }

    async fn generate_with_memory(
        &self,
        prompt: &str,
        _session: &ProviderSession,
    ) -> FolioResult<String> {
        self.generate(prompt, 0).await
    }

    async fn scan_patterns(&self, prompt: &str) -> FolioResult<Vec<RawMatch>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .scans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScanReply::Items(Vec::new()));
        match reply {
            ScanReply::Items(items) => Ok(items),
            ScanReply::Malformed => Err(ProviderError::new(
                &self.name,
                ProviderErrorKind::RetriesExhausted {
                    attempts: 5,
                    last: Box::new(ProviderErrorKind::Malformed(
                        "No JSON found in scan reply".into(),
                    )),
                },
            )
            .into()),
            ScanReply::Exhausted => Err(ProviderError::new(
                &self.name,
                ProviderErrorKind::RetriesExhausted {
                    attempts: 5,
                    last: Box::new(ProviderErrorKind::Transient("connection reset".into())),
                },
            )
            .into()),
        }
    }
}
