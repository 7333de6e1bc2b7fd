//! Interactive decision source on numbered console menus.

use async_trait::async_trait;
use folio_core::{
    DecisionRequest, DecisionScope, Match, MatchGroup, RevisionDecision, RewriteProposal,
    RewriteVerdict,
};
use folio_error::{FolioResult, IoError, RevisionError, RevisionErrorKind};
use folio_interface::DecisionSource;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

/// Operation picked from a menu, before its scope is known.
enum Choice {
    Keep,
    Delete,
    Replace,
    Rewrite,
    Narrow,
}

fn parse_choice(input: &str) -> Option<Choice> {
    match input.trim() {
        "1" => Some(Choice::Keep),
        "2" => Some(Choice::Delete),
        "3" => Some(Choice::Replace),
        "4" => Some(Choice::Rewrite),
        "5" => Some(Choice::Narrow),
        _ => None,
    }
}

fn invalid(input: &str) -> folio_error::FolioError {
    RevisionError::new(RevisionErrorKind::InvalidDecision(input.trim().to_string())).into()
}

/// Asks the operator through numbered menus.
///
/// Any answer that is not a listed option fails with `InvalidDecision` and
/// the revision engine asks again. End of input fails with
/// `DecisionSourceExhausted`.
///
/// ```text
/// 3 matches across 2 patterns
///   1) Keep all
///   2) Delete all
///   3) Replace all with text
///   4) Rewrite all with a provider
///   5) Decide per pattern
/// >
/// ```
pub struct ConsoleDecisionSource<R, W> {
    reader: BufReader<R>,
    writer: W,
}

impl ConsoleDecisionSource<tokio::io::Stdin, tokio::io::Stdout> {
    /// Menus on the process's standard input and output.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> ConsoleDecisionSource<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Menus read from `reader` and printed to `writer`.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Give back the output sink.
    pub fn into_writer(self) -> W {
        self.writer
    }

    async fn print(&mut self, text: &str) -> FolioResult<()> {
        self.writer
            .write_all(text.as_bytes())
            .await
            .map_err(|e| IoError::new(format!("Failed to write prompt: {}", e)))?;
        self.writer
            .flush()
            .await
            .map_err(|e| IoError::new(format!("Failed to flush prompt: {}", e)))?;
        Ok(())
    }

    async fn read_line(&mut self) -> FolioResult<String> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| IoError::new(format!("Failed to read answer: {}", e)))?;
        if read == 0 {
            return Err(RevisionError::new(RevisionErrorKind::DecisionSourceExhausted).into());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn ask(&mut self, menu: &str) -> FolioResult<String> {
        self.print(menu).await?;
        self.print("> ").await?;
        self.read_line().await
    }

    /// Turn a picked operation into a decision, reading replacement text
    /// or rewrite guidance when needed.
    async fn complete(
        &mut self,
        choice: Choice,
        scope: DecisionScope,
    ) -> FolioResult<RevisionDecision> {
        match choice {
            Choice::Keep => Ok(RevisionDecision::keep(scope)),
            Choice::Delete => Ok(RevisionDecision::delete(scope)),
            Choice::Replace => {
                self.print("Replacement text: ").await?;
                let text = self.read_line().await?;
                if text.trim().is_empty() {
                    return Err(invalid("empty replacement"));
                }
                Ok(RevisionDecision::literal(text.trim(), scope))
            }
            Choice::Rewrite => {
                self.print("Guidance for the rewrite (blank for none): ").await?;
                let guidance = self.read_line().await?;
                Ok(RevisionDecision::rewrite(guidance.trim(), scope))
            }
            // Narrowing is resolved by the caller
            Choice::Narrow => Ok(RevisionDecision::keep(scope)),
        }
    }
}

fn run_menu(groups: &[MatchGroup]) -> String {
    let matches: usize = groups.iter().map(MatchGroup::len).sum();
    let mut menu = format!("\n{} matches across {} patterns\n", matches, groups.len());
    for group in groups {
        menu.push_str(&format!("  - {} ({})\n", group.pattern(), group.len()));
    }
    menu.push_str(
        "  1) Keep all\n  2) Delete all\n  3) Replace all with text\n  \
         4) Rewrite all with a provider\n  5) Decide per pattern\n",
    );
    menu
}

fn group_menu(group: &MatchGroup) -> String {
    let mut menu = format!("\nPattern \"{}\": {} matches\n", group.pattern(), group.len());
    for found in group.matches() {
        menu.push_str(&format!("  [{}] {}\n", found.sentence_index(), found.sentence()));
    }
    menu.push_str(
        "  1) Keep these\n  2) Delete these\n  3) Replace these with text\n  \
         4) Rewrite these with a provider\n  5) Decide per match\n",
    );
    menu
}

fn match_menu(found: &Match, position: usize, of: usize) -> String {
    format!(
        "\n\"{}\" match {}/{} (sentence {}, reported by {})\n  {}\n  matched: {}\n  \
         1) Keep\n  2) Delete\n  3) Replace with text\n  4) Rewrite with a provider\n  \
         5) Keep the rest of this pattern\n",
        found.pattern(),
        position,
        of,
        found.sentence_index(),
        found.provider(),
        found.sentence(),
        found.matched(),
    )
}

#[async_trait]
impl<R, W> DecisionSource for ConsoleDecisionSource<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn next_decision(
        &mut self,
        request: &DecisionRequest<'_>,
    ) -> FolioResult<RevisionDecision> {
        let (menu, scope) = match request {
            DecisionRequest::Run { groups } => (run_menu(groups), DecisionScope::Global),
            DecisionRequest::Group { group } => (group_menu(group), DecisionScope::Group),
            DecisionRequest::Match {
                found,
                position,
                of,
            } => (match_menu(found, *position, *of), DecisionScope::SingleMatch),
        };

        let answer = self.ask(&menu).await?;
        let choice = parse_choice(&answer).ok_or_else(|| invalid(&answer))?;
        debug!(answer = %answer.trim(), %scope, "Console answer");

        match (choice, scope) {
            // Narrowing from the top or a group descends one level
            (Choice::Narrow, DecisionScope::Global) | (Choice::Narrow, DecisionScope::Group) => {
                Ok(RevisionDecision::keep(DecisionScope::SingleMatch))
            }
            (Choice::Narrow, DecisionScope::SingleMatch) => {
                Ok(RevisionDecision::keep(DecisionScope::Group))
            }
            (choice, scope) => self.complete(choice, scope).await,
        }
    }

    async fn review_rewrite(&mut self, proposal: &RewriteProposal) -> FolioResult<RewriteVerdict> {
        let menu = format!(
            "\nRewrite #{} for \"{}\"\n  original: {}\n  proposed: {}\n  \
             1) Accept\n  2) Regenerate\n  3) Keep original\n",
            proposal.attempt(),
            proposal.pattern(),
            proposal.original(),
            proposal.proposed(),
        );
        let answer = self.ask(&menu).await?;
        match answer.trim() {
            "1" => Ok(RewriteVerdict::Accept),
            "2" => Ok(RewriteVerdict::Regenerate),
            "3" => Ok(RewriteVerdict::KeepOriginal),
            _ => Err(invalid(&answer)),
        }
    }
}
