//! Per-provider conversational state for one chapter.

use folio_core::{MemoryHandle, ProviderSession};
use tracing::trace;

/// Conversation a provider carries across the fragments of one chapter.
///
/// Wraps the chapter's [`ProviderSession`]. Providers with a native thread
/// keep the history themselves; for every other provider each raw response
/// is appended to the session transcript behind a fragment marker before
/// the next call. A context is created at chapter start and dropped at
/// chapter end.
#[derive(Debug, Clone)]
pub struct MemoryContext {
    session: ProviderSession,
    recorded: usize,
}

impl MemoryContext {
    /// Wrap a freshly opened session.
    pub fn new(session: ProviderSession) -> Self {
        Self {
            session,
            recorded: 0,
        }
    }

    /// The session to pass to the provider.
    pub fn session(&self) -> &ProviderSession {
        &self.session
    }

    /// Whether the provider keeps history natively.
    pub fn is_native(&self) -> bool {
        matches!(self.session.handle(), MemoryHandle::Thread { .. })
    }

    /// Record the raw response of fragment `index` (1-based).
    pub fn record(&mut self, index: usize, raw: &str) {
        self.recorded += 1;
        if self.is_native() {
            return;
        }
        self.session
            .append_transcript(&format!("[Fragment {}]\n{}\n\n", index, raw.trim()));
        trace!(
            index,
            transcript_chars = self.session.transcript().len(),
            "Appended to transcript"
        );
    }

    /// Fragments recorded so far.
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Give back the session, e.g. to close it.
    pub fn into_session(self) -> ProviderSession {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_grows_with_markers() {
        let mut memory =
            MemoryContext::new(ProviderSession::new("openai", MemoryHandle::Transcript, "ref"));
        memory.record(1, "The cave was dark.\n");
        memory.record(2, "A light flickered.");
        assert_eq!(
            memory.session().transcript(),
            "[Fragment 1]\nThe cave was dark.\n\n[Fragment 2]\nA light flickered.\n\n"
        );
        assert_eq!(memory.recorded(), 2);
    }

    #[test]
    fn test_thread_memory_stays_implicit() {
        let handle = MemoryHandle::Thread {
            id: "thread_1".into(),
        };
        let mut memory = MemoryContext::new(ProviderSession::new("assistants", handle, "ref"));
        memory.record(1, "The cave was dark.");
        assert!(memory.session().transcript().is_empty());
        assert_eq!(memory.recorded(), 1);
    }
}
