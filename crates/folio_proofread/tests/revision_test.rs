mod test_utils;

use folio_core::{BookBuilder, Chapter, DecisionScope, MatchGroup, RevisionDecision, RewriteVerdict};
use folio_error::{GenerationErrorKind, RevisionErrorKind};
use folio_proofread::{
    IndexedChapter, MatchMerger, PatternAction, PatternSpec, PolicyDecisionSource,
    ProofreadConfig, ProofreadPass, ProviderFindings, RevisionEngine, ScriptedDecisionSource,
    Segmentation, segment,
};
use test_utils::{MockProvider, ScanReply, as_providers, finding};

const TEXT: &str =
    "The door creaked. Her heart raced. She ran. Her heart raced again. The end.";

fn chapter() -> IndexedChapter {
    IndexedChapter::new(TEXT, Segmentation::AbbreviationAware)
}

/// Heart findings at 2 and 4, a door finding at 1.
fn groups() -> Vec<MatchGroup> {
    let reports = vec![
        ProviderFindings::new("heart raced", "a", vec![
            finding("heart raced", "Her heart raced.", 2),
            finding("heart raced", "Her heart raced again.", 4),
        ]),
        ProviderFindings::new("door creaked", "a", vec![finding(
            "creaked",
            "The door creaked.",
            1,
        )]),
    ];
    MatchMerger::new(chapter().len()).merge(&reports)
}

fn config() -> ProofreadConfig {
    ProofreadConfig::builder()
        .patterns(vec![
            PatternSpec::new("heart raced", "Racing hearts"),
            PatternSpec::new("door creaked", "Creaking doors"),
        ])
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_global_delete_touches_every_match() -> anyhow::Result<()> {
    let config = config();
    let mut source =
        ScriptedDecisionSource::new().then(RevisionDecision::delete(DecisionScope::Global));

    let outcome = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await?;

    assert_eq!(outcome.text(), "She ran. The end.");
    assert_eq!(outcome.applied(), 3);
    assert_eq!(source.asked(), &["run"]);
    assert_eq!(outcome.chapter().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_group_mode_decides_per_pattern() -> anyhow::Result<()> {
    let config = config();
    let mut source = ScriptedDecisionSource::new()
        .then(RevisionDecision::keep(DecisionScope::Group))
        .then(RevisionDecision::literal("Her pulse jumped.", DecisionScope::Group))
        .then(RevisionDecision::keep(DecisionScope::Group));

    let outcome = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await?;

    assert_eq!(
        outcome.text(),
        "The door creaked. Her pulse jumped. She ran. Her pulse jumped. The end."
    );
    assert_eq!((outcome.applied(), outcome.kept()), (2, 1));
    assert_eq!(source.asked(), &["run", "group heart raced", "group door creaked"]);
    Ok(())
}

#[tokio::test]
async fn test_match_mode_asks_each_match() -> anyhow::Result<()> {
    let config = config();
    let mut source = ScriptedDecisionSource::new()
        .then(RevisionDecision::keep(DecisionScope::SingleMatch))
        .then(RevisionDecision::keep(DecisionScope::SingleMatch))
        .then(RevisionDecision::delete(DecisionScope::SingleMatch))
        .then(RevisionDecision::keep(DecisionScope::SingleMatch))
        .then(RevisionDecision::keep(DecisionScope::Group));

    let outcome = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await?;

    assert_eq!(
        outcome.text(),
        "The door creaked. She ran. Her heart raced again. The end."
    );
    assert_eq!(source.asked(), &[
        "run",
        "group heart raced",
        "match heart raced 1/2",
        "match heart raced 2/2",
        "group door creaked",
    ]);
    assert_eq!(source.remaining(), 0);
    Ok(())
}

#[tokio::test]
async fn test_match_answer_can_widen_to_global() -> anyhow::Result<()> {
    let config = config();
    let mut source = ScriptedDecisionSource::new()
        .then(RevisionDecision::keep(DecisionScope::Group))
        .then(RevisionDecision::keep(DecisionScope::SingleMatch))
        .then(RevisionDecision::delete(DecisionScope::Global));

    let outcome = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await?;

    assert_eq!(outcome.text(), "She ran. The end.");
    assert_eq!(source.asked().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_invalid_answers_are_asked_again() -> anyhow::Result<()> {
    let config = config();
    let mut source = ScriptedDecisionSource::new()
        .then_invalid("9")
        .then_invalid("x")
        .then(RevisionDecision::keep(DecisionScope::Global));

    let outcome = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await?;

    assert_eq!(outcome.text(), TEXT);
    assert_eq!(outcome.kept(), 3);
    assert_eq!(source.asked(), &["run", "run", "run"]);
    Ok(())
}

#[tokio::test]
async fn test_too_many_invalid_answers() {
    let config = ProofreadConfig::builder()
        .max_invalid_decisions(2u32)
        .build()
        .unwrap();
    let mut source = ScriptedDecisionSource::new()
        .then_invalid("9")
        .then_invalid("9")
        .then(RevisionDecision::keep(DecisionScope::Global));

    let err = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await
        .unwrap_err();

    assert_eq!(
        err.as_revision().unwrap().kind,
        RevisionErrorKind::TooManyInvalidDecisions(2)
    );
}

#[tokio::test]
async fn test_exhausted_script_fails() {
    let config = config();
    let mut source = ScriptedDecisionSource::new();
    let err = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await
        .unwrap_err();
    assert_eq!(
        err.as_revision().unwrap().kind,
        RevisionErrorKind::DecisionSourceExhausted
    );
}

#[tokio::test]
async fn test_no_groups_asks_nothing() -> anyhow::Result<()> {
    let config = config();
    let mut source = ScriptedDecisionSource::new();
    let outcome = RevisionEngine::new(&config)
        .revise(&chapter(), &[], &mut source)
        .await?;
    assert_eq!(outcome.text(), TEXT);
    assert!(source.asked().is_empty());
    Ok(())
}

fn door_only() -> Vec<MatchGroup> {
    groups().into_iter().filter(|g| g.pattern() == "door creaked").collect()
}

#[tokio::test]
async fn test_rewrite_regenerates_until_accepted() -> anyhow::Result<()> {
    let config = config();
    let rewriter = MockProvider::new("writer")
        .rewrite("The door groaned.")
        .rewrite("The door swung open.");
    let mut source = ScriptedDecisionSource::new()
        .then(RevisionDecision::rewrite("Keep it short", DecisionScope::Global))
        .then_verdict(RewriteVerdict::Regenerate)
        .then_verdict(RewriteVerdict::Accept);

    let outcome = RevisionEngine::new(&config)
        .with_rewriter(&rewriter)
        .revise(&chapter(), &door_only(), &mut source)
        .await?;

    assert!(outcome.text().starts_with("The door swung open. Her heart raced."));
    assert_eq!(source.asked(), &[
        "run",
        "rewrite door creaked #1",
        "rewrite door creaked #2"
    ]);

    let prompts = rewriter.prompts();
    assert!(prompts[0].contains("\"door creaked\" (Creaking doors)"));
    assert!(prompts[0].contains("Guidance: Keep it short"));
    assert!(prompts[0].contains("Sentence: The door creaked."));
    assert!(prompts[0].contains("Following sentence: Her heart raced."));
    assert!(prompts[1].ends_with("Do not repeat this rejected version: The door groaned."));
    Ok(())
}

#[tokio::test]
async fn test_rewrite_loop_is_bounded() -> anyhow::Result<()> {
    let config = ProofreadConfig::builder()
        .max_rewrite_attempts(2u32)
        .build()
        .unwrap();
    let rewriter = MockProvider::new("writer");
    let mut source = ScriptedDecisionSource::new()
        .then(RevisionDecision::rewrite("", DecisionScope::Global))
        .then_verdict(RewriteVerdict::Regenerate)
        .then_verdict(RewriteVerdict::Regenerate)
        .then_verdict(RewriteVerdict::Accept);

    let outcome = RevisionEngine::new(&config)
        .with_rewriter(&rewriter)
        .revise(&chapter(), &door_only(), &mut source)
        .await?;

    assert_eq!(outcome.text(), TEXT);
    assert_eq!(outcome.kept(), 1);
    assert_eq!(rewriter.prompts().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rewrite_keep_original() -> anyhow::Result<()> {
    let config = config();
    let rewriter = MockProvider::new("writer");
    let mut source = ScriptedDecisionSource::new()
        .then(RevisionDecision::rewrite("", DecisionScope::Global))
        .then_verdict(RewriteVerdict::KeepOriginal);

    let outcome = RevisionEngine::new(&config)
        .with_rewriter(&rewriter)
        .revise(&chapter(), &door_only(), &mut source)
        .await?;

    assert_eq!(outcome.text(), TEXT);
    assert_eq!(rewriter.prompts().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rewrite_without_provider_is_config_error() {
    let config = config();
    let mut source = ScriptedDecisionSource::new()
        .then(RevisionDecision::rewrite("", DecisionScope::Global));

    let err = RevisionEngine::new(&config)
        .revise(&chapter(), &door_only(), &mut source)
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_generation().unwrap().kind,
        GenerationErrorKind::InvalidConfiguration(_)
    ));
}

#[tokio::test]
async fn test_delete_removes_exactly_one_sentence() -> anyhow::Result<()> {
    let text = "Mr. Holt waited. It rained.\nIt rained. Dr. Reyes came... late. Done!";
    let indexed = IndexedChapter::new(text, Segmentation::AbbreviationAware);
    let original = segment(text, Segmentation::AbbreviationAware);
    let config = ProofreadConfig::default();

    for index in 1..=indexed.len() {
        let sentence = indexed.sentence(index).unwrap();
        let groups = MatchMerger::new(indexed.len()).merge(&[ProviderFindings::new(
            "p",
            "a",
            vec![finding("x", sentence, index)],
        )]);
        let mut source =
            ScriptedDecisionSource::new().then(RevisionDecision::delete(DecisionScope::Global));

        let outcome = RevisionEngine::new(&config)
            .revise(&indexed, &groups, &mut source)
            .await?;

        let mut expected = original.clone();
        expected.remove(index - 1);
        let after: Vec<&str> = outcome.chapter().sentences().collect();
        assert_eq!(after, expected, "deleting sentence {index}");
    }
    Ok(())
}

#[tokio::test]
async fn test_pass_with_policy_revises_book() -> anyhow::Result<()> {
    let config = ProofreadConfig::builder()
        .providers(vec!["a".to_string(), "b".to_string()])
        .patterns(vec![
            PatternSpec::new("heart raced", "Racing hearts").with_action(PatternAction::Delete),
        ])
        .build()?;
    let a = MockProvider::new("a")
        .scan(ScanReply::Items(vec![finding("heart raced", "Her heart raced.", 2)]))
        .shared();
    let b = MockProvider::new("b")
        .scan(ScanReply::Malformed)
        .scan(ScanReply::Items(vec![
            finding("heart raced", "Her heart raced.", 2),
            finding("raced", "Her heart raced again.", 4),
        ]))
        .shared();
    let providers = as_providers(&[a, b]);

    let mut book = BookBuilder::default()
        .outline("A door, a heart.")
        .chapters(vec![Chapter::from_text(1, TEXT)])
        .build()?;
    let mut source = PolicyDecisionSource::from_config(&config);

    let reports = ProofreadPass::new(&providers, &config)
        .run_book(&mut book, &mut source)
        .await?;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].groups()[0].len(), 2);
    assert_eq!(reports[0].outcome().applied(), 2);
    assert_eq!(book.chapters()[0].text(), "The door creaked. She ran. The end.");
    Ok(())
}

#[tokio::test]
async fn test_policy_mixed_actions_decide_per_group() -> anyhow::Result<()> {
    let config = ProofreadConfig::builder()
        .patterns(vec![
            PatternSpec::new("heart raced", "Racing hearts").with_action(PatternAction::Delete),
            PatternSpec::new("door creaked", "Creaking doors"),
        ])
        .build()?;
    let mut source = PolicyDecisionSource::from_config(&config);

    let outcome = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await?;

    assert_eq!(outcome.text(), "The door creaked. She ran. The end.");
    assert_eq!(outcome.kept(), 1);
    Ok(())
}

#[tokio::test]
async fn test_policy_fallback_covers_patterns_without_action() -> anyhow::Result<()> {
    let config = ProofreadConfig::builder()
        .patterns(vec![
            PatternSpec::new("heart raced", "Racing hearts").with_action(PatternAction::Delete),
            PatternSpec::new("door creaked", "Creaking doors"),
        ])
        .build()?;
    let mut source =
        PolicyDecisionSource::from_config(&config).with_fallback(PatternAction::Delete);

    let outcome = RevisionEngine::new(&config)
        .revise(&chapter(), &groups(), &mut source)
        .await?;

    assert_eq!(outcome.text(), "She ran. The end.");
    assert_eq!(outcome.applied(), 3);
    assert_eq!(outcome.kept(), 0);
    Ok(())
}
