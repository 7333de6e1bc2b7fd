//! Trait definition for revision decision input.

use async_trait::async_trait;
use folio_core::{DecisionRequest, RevisionDecision, RewriteProposal, RewriteVerdict};
use folio_error::FolioResult;

/// Source of revision decisions: an operator, a policy or a script.
///
/// An answer that names an option which does not exist is reported as
/// `RevisionErrorKind::InvalidDecision`; the caller asks again.
#[async_trait]
pub trait DecisionSource: Send {
    /// Decide what to do for the requested match, group or whole pass.
    async fn next_decision(
        &mut self,
        request: &DecisionRequest<'_>,
    ) -> FolioResult<RevisionDecision>;

    /// Accept, regenerate or abandon a proposed rewrite.
    async fn review_rewrite(&mut self, proposal: &RewriteProposal) -> FolioResult<RewriteVerdict>;
}
