//! Non-interactive decision sources.

use crate::{PatternAction, ProofreadConfig};
use async_trait::async_trait;
use folio_core::{DecisionRequest, DecisionScope, RevisionDecision, RewriteProposal, RewriteVerdict};
use folio_error::{FolioResult, RevisionError, RevisionErrorKind};
use folio_interface::DecisionSource;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// One scripted answer to a decision question.
#[derive(Debug, Clone)]
enum Answer {
    Decide(RevisionDecision),
    Invalid(String),
}

/// Replays a fixed queue of answers, for batch runs and tests.
///
/// Every question pops the next answer; an empty queue fails with
/// `DecisionSourceExhausted`. Questions are recorded so callers can check
/// what was asked.
///
/// # Examples
///
/// ```
/// use folio_core::{DecisionScope, RevisionDecision, RewriteVerdict};
/// use folio_proofread::ScriptedDecisionSource;
///
/// let source = ScriptedDecisionSource::new()
///     .then(RevisionDecision::rewrite("", DecisionScope::Global))
///     .then_verdict(RewriteVerdict::Accept);
/// assert_eq!(source.remaining(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisionSource {
    answers: VecDeque<Answer>,
    verdicts: VecDeque<RewriteVerdict>,
    asked: Vec<String>,
}

impl ScriptedDecisionSource {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a decision.
    pub fn then(mut self, decision: RevisionDecision) -> Self {
        self.answers.push_back(Answer::Decide(decision));
        self
    }

    /// Queue an answer naming an option that does not exist.
    pub fn then_invalid(mut self, input: impl Into<String>) -> Self {
        self.answers.push_back(Answer::Invalid(input.into()));
        self
    }

    /// Queue a rewrite verdict.
    pub fn then_verdict(mut self, verdict: RewriteVerdict) -> Self {
        self.verdicts.push_back(verdict);
        self
    }

    /// Decision answers not yet used.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// Questions asked so far, e.g. `run`, `group heart raced`, `match heart raced 2/3`,
    /// `rewrite heart raced #1`.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }
}

fn describe(request: &DecisionRequest<'_>) -> String {
    match request {
        DecisionRequest::Run { .. } => "run".to_string(),
        DecisionRequest::Group { group } => format!("group {}", group.pattern()),
        DecisionRequest::Match {
            found,
            position,
            of,
        } => format!("match {} {}/{}", found.pattern(), position, of),
    }
}

#[async_trait]
impl DecisionSource for ScriptedDecisionSource {
    async fn next_decision(
        &mut self,
        request: &DecisionRequest<'_>,
    ) -> FolioResult<RevisionDecision> {
        self.asked.push(describe(request));
        match self.answers.pop_front() {
            Some(Answer::Decide(decision)) => Ok(decision),
            Some(Answer::Invalid(input)) => {
                Err(RevisionError::new(RevisionErrorKind::InvalidDecision(input)).into())
            }
            None => Err(RevisionError::new(RevisionErrorKind::DecisionSourceExhausted).into()),
        }
    }

    async fn review_rewrite(&mut self, proposal: &RewriteProposal) -> FolioResult<RewriteVerdict> {
        self.asked
            .push(format!("rewrite {} #{}", proposal.pattern(), proposal.attempt()));
        self.verdicts
            .pop_front()
            .ok_or_else(|| RevisionError::new(RevisionErrorKind::DecisionSourceExhausted).into())
    }
}

/// Decides from each pattern's configured action.
///
/// Patterns without an action fall back to the default (keep). When every
/// group in a pass shares one action it is applied globally; otherwise each
/// group gets its own. Rewrites are always accepted.
#[derive(Debug, Clone)]
pub struct PolicyDecisionSource {
    actions: HashMap<String, PatternAction>,
    fallback: PatternAction,
}

impl PolicyDecisionSource {
    /// Build from pattern actions in `config`.
    pub fn from_config(config: &ProofreadConfig) -> Self {
        Self {
            actions: config
                .patterns()
                .iter()
                .filter_map(|p| p.action().map(|a| (p.id().clone(), a)))
                .collect(),
            fallback: PatternAction::Keep,
        }
    }

    /// Action for patterns without one.
    pub fn with_fallback(mut self, fallback: PatternAction) -> Self {
        self.fallback = fallback;
        self
    }

    fn action(&self, pattern: &str) -> PatternAction {
        self.actions.get(pattern).copied().unwrap_or(self.fallback)
    }
}

fn decision(action: PatternAction, scope: DecisionScope) -> RevisionDecision {
    match action {
        PatternAction::Keep => RevisionDecision::keep(scope),
        PatternAction::Delete => RevisionDecision::delete(scope),
        PatternAction::Rewrite => RevisionDecision::rewrite("", scope),
    }
}

#[async_trait]
impl DecisionSource for PolicyDecisionSource {
    async fn next_decision(
        &mut self,
        request: &DecisionRequest<'_>,
    ) -> FolioResult<RevisionDecision> {
        let decided = match request {
            DecisionRequest::Run { groups } => {
                let mut actions = groups.iter().map(|g| self.action(g.pattern()));
                match actions.next() {
                    Some(first) if actions.all(|a| a == first) => {
                        decision(first, DecisionScope::Global)
                    }
                    // Mixed actions: decide per group
                    _ => RevisionDecision::keep(DecisionScope::Group),
                }
            }
            DecisionRequest::Group { group } => {
                decision(self.action(group.pattern()), DecisionScope::Group)
            }
            DecisionRequest::Match { found, .. } => {
                decision(self.action(found.pattern()), DecisionScope::SingleMatch)
            }
        };
        debug!(
            question = %describe(request),
            operation = %decided.operation(),
            scope = %decided.scope(),
            "Policy decision"
        );
        Ok(decided)
    }

    async fn review_rewrite(&mut self, _proposal: &RewriteProposal) -> FolioResult<RewriteVerdict> {
        Ok(RewriteVerdict::Accept)
    }
}
