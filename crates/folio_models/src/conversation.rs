//! Provider-neutral conversation assembled from a session.

use folio_core::ProviderSession;

/// Request that stands in for the transcript when it is replayed as a turn.
pub(crate) const PRIOR_REQUEST: &str = "Write the story so far.";

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Speaker {
    User,
    Assistant,
}

/// A single conversational turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// System text plus ordered turns, ending with the new prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Conversation {
    pub system: Option<String>,
    pub turns: Vec<Turn>,
}

impl Conversation {
    /// A single user prompt with no memory.
    pub fn single(prompt: &str) -> Self {
        Self {
            system: None,
            turns: vec![Turn {
                speaker: Speaker::User,
                text: prompt.to_string(),
            }],
        }
    }

    /// Reference material as system text, the transcript as a prior
    /// exchange, then the prompt.
    pub fn from_session(prompt: &str, session: &ProviderSession) -> Self {
        let system = Some(session.reference().trim().to_string()).filter(|s| !s.is_empty());
        let mut turns = Vec::with_capacity(3);

        let transcript = session.transcript().trim();
        if !transcript.is_empty() {
            turns.push(Turn {
                speaker: Speaker::User,
                text: PRIOR_REQUEST.to_string(),
            });
            turns.push(Turn {
                speaker: Speaker::Assistant,
                text: transcript.to_string(),
            });
        }

        turns.push(Turn {
            speaker: Speaker::User,
            text: prompt.to_string(),
        });

        Self { system, turns }
    }

    /// Drop the system text, e.g. when a provider cache already holds it.
    pub fn without_system(mut self) -> Self {
        self.system = None;
        self
    }

    /// Total characters, for logging.
    pub fn len(&self) -> usize {
        self.system.as_ref().map_or(0, String::len)
            + self.turns.iter().map(|t| t.text.len()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::MemoryHandle;

    #[test]
    fn test_fresh_session_sends_reference_and_prompt() {
        let session = ProviderSession::new("openai", MemoryHandle::Transcript, "Outline:\nA cave.");
        let conversation = Conversation::from_session("Begin.", &session);
        assert_eq!(conversation.system.as_deref(), Some("Outline:\nA cave."));
        assert_eq!(conversation.turns.len(), 1);
        assert_eq!(conversation.turns[0].text, "Begin.");
    }

    #[test]
    fn test_transcript_becomes_prior_exchange() {
        let mut session = ProviderSession::new("openai", MemoryHandle::Transcript, "");
        session.append_transcript("[Fragment 1]\nThe cave was dark.\n\n");
        let conversation = Conversation::from_session("Continue.", &session);
        assert!(conversation.system.is_none());
        assert_eq!(conversation.turns.len(), 3);
        assert_eq!(conversation.turns[0].speaker, Speaker::User);
        assert_eq!(conversation.turns[1].speaker, Speaker::Assistant);
        assert_eq!(conversation.turns[1].text, "[Fragment 1]\nThe cave was dark.");
        assert_eq!(conversation.turns[2].text, "Continue.");
    }
}
