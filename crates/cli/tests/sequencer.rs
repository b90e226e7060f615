// Path: crates/cli/tests/sequencer.rs

mod common;

use anyhow::Result;
use common::{sequencer, session, unreachable, upgrade_proposal, MockChain, MockRunner};
use forklift_cli::orchestrator::{SequencerState, VersionOutcome};
use forklift_types::app::VersionSequenceEntry;
use forklift_types::error::UpgradeError;
use time::macros::datetime;

#[tokio::test]
async fn test_full_sequence_with_non_breaking_entry() -> Result<()> {
    // Plan at 100 -> upgrade height 110. Phase 1 sees 105, 110; Phase 2 sees 111.
    // The final check samples a 111 baseline and then 112.
    let chain = MockChain::with_heights(&[100, 105, 110, 111, 111, 112])
        .with_version("v2.0.1")
        .with_proposals(vec![upgrade_proposal(
            "1",
            "v2.0.0",
            110,
            datetime!(2024-05-01 10:00 UTC),
        )]);
    let runner = MockRunner::default();
    let mut seq = sequencer(&chain, &runner, 5);

    let entries = vec![
        VersionSequenceEntry::breaking("v2.0.0"),
        VersionSequenceEntry::non_breaking("v2.0.1"),
    ];
    let report = seq.run(&session(), &entries, None).await?;

    assert_eq!(
        report.outcomes,
        vec![
            VersionOutcome::Confirmed {
                version: "v2.0.0".into(),
                proposal_id: "1".into(),
                upgrade_height: 110,
                reached_at: 110,
                advanced_to: 111,
            },
            VersionOutcome::Skipped {
                version: "v2.0.1".into()
            },
        ]
    );
    assert_eq!(report.end_version, "v2.0.1");
    assert_eq!(report.final_height, 112);
    assert_eq!(seq.state(), SequencerState::Idle);

    // Governance ran once for the breaking entry only.
    assert_eq!(runner.calls_with("submit-legacy-proposal").len(), 1);
    assert_eq!(runner.calls_with("vote").len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_non_breaking_only_skips_governance() -> Result<()> {
    let chain = MockChain::with_heights(&[40, 41]).with_version("v1.0.1");
    let runner = MockRunner::default();
    let mut seq = sequencer(&chain, &runner, 5);

    let report = seq
        .run(&session(), &[VersionSequenceEntry::non_breaking("v1.0.1")], None)
        .await?;
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].version(), "v1.0.1");
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_version_mismatch_is_fatal() {
    let chain = MockChain::with_heights(&[40, 41]).with_version("v1.0.0");
    let runner = MockRunner::default();
    let mut seq = sequencer(&chain, &runner, 5);

    let err = seq
        .run(
            &session(),
            &[VersionSequenceEntry::non_breaking("v1.0.1")],
            Some("v1.0.2"),
        )
        .await
        .unwrap_err();
    match err {
        UpgradeError::VersionMismatch { expected, actual } => {
            assert_eq!(expected, "v1.0.2");
            assert_eq!(actual, "v1.0.0");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_stall_aborts_sequence() {
    // Reaches 110 and never moves again.
    let chain = MockChain::with_heights(&[100, 110])
        .with_version("v3.0.0")
        .with_proposals(vec![
            upgrade_proposal("1", "v2.0.0", 110, datetime!(2024-05-01 10:00 UTC)),
            upgrade_proposal("2", "v3.0.0", 130, datetime!(2024-05-02 10:00 UTC)),
        ]);
    let runner = MockRunner::default();
    let mut seq = sequencer(&chain, &runner, 4);

    let entries = vec![
        VersionSequenceEntry::breaking("v2.0.0"),
        VersionSequenceEntry::breaking("v3.0.0"),
    ];
    let err = seq.run(&session(), &entries, None).await.unwrap_err();
    assert!(matches!(
        err,
        UpgradeError::LivenessStall {
            height: 110,
            samples: 4
        }
    ));
    assert_eq!(seq.state(), SequencerState::Stalled);
    // The second version was never proposed.
    assert_eq!(runner.calls_with("submit-legacy-proposal").len(), 1);
}

#[tokio::test]
async fn test_empty_sequence_without_end_version() {
    let chain = MockChain::with_heights(&[1]);
    let runner = MockRunner::default();
    let mut seq = sequencer(&chain, &runner, 1);

    assert!(matches!(
        seq.run(&session(), &[], None).await,
        Err(UpgradeError::EmptySequence)
    ));
}

#[tokio::test]
async fn test_transient_error_before_proposal_is_retried() -> Result<()> {
    let chain = MockChain::scripted(vec![
        Err(unreachable()),
        Ok(100),
        Ok(105),
        Ok(110),
        Ok(111),
        Ok(111),
        Ok(112),
    ])
    .with_version("v2.0.0")
    .with_proposals(vec![upgrade_proposal(
        "1",
        "v2.0.0",
        110,
        datetime!(2024-05-01 10:00 UTC),
    )]);
    let runner = MockRunner::default();
    let mut seq = sequencer(&chain, &runner, 5);

    let report = seq
        .run(&session(), &[VersionSequenceEntry::breaking("v2.0.0")], None)
        .await?;
    match &report.outcomes[0] {
        VersionOutcome::Confirmed { upgrade_height, .. } => assert_eq!(*upgrade_height, 110),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(runner.calls_with("submit-legacy-proposal").len(), 1);
    Ok(())
}
