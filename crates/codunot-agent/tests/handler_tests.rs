// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end message handling against mock collaborators.

use std::time::Duration;

use codunot_agent::handler::GENERATION_FAILED_REPLY;
use codunot_agent::{HandleOutcome, SaveSummary, spawn_autosave};
use codunot_core::{CodunotError, EntityKey, Limit, Mode, Mood, ResourceKind};
use codunot_test_utils::{MockSubject, TestHarness};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

async fn used(harness: &TestHarness, key: &str, kind: ResourceKind) -> u64 {
    let mut state = harness.state.lock().await;
    let report = state.usage.report(&EntityKey::from(key));
    report
        .daily
        .iter()
        .find(|line| line.kind == kind)
        .map(|line| line.used)
        .unwrap_or_default()
}

#[tokio::test]
async fn reply_is_generated_from_history_before_the_message() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["hi alice".to_string(), "still here".to_string()])
        .build()
        .unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");

    let first = harness.send(&alice, "hello").await.unwrap();
    assert_eq!(first, HandleOutcome::Replied("hi alice".to_string()));
    harness.send(&alice, "you there?").await.unwrap();

    let contexts = harness.generator.contexts().await;
    assert_eq!(contexts.len(), 2);
    assert!(contexts[0].recent.is_empty());
    assert_eq!(contexts[0].message, "hello");
    assert_eq!(contexts[0].speaker, "alice");
    assert_eq!(contexts[1].recent, vec!["alice: hello", "codunot: hi alice"]);
    assert_eq!(alice.replies().await, vec!["hi alice", "still here"]);

    let state = harness.state.lock().await;
    assert_eq!(state.channels.history_len(&alice_channel()), 4);
}

fn alice_channel() -> codunot_core::ChannelId {
    codunot_core::ChannelId::from("c1")
}

#[tokio::test]
async fn context_carries_topics_and_speaker_moods() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    let bob = MockSubject::guild("g1", "c1", "bob");

    harness.send(&alice, "lol let's talk about rust").await.unwrap();
    harness.send(&bob, "wtf is a borrow checker").await.unwrap();
    harness.send(&alice, "ok").await.unwrap();

    let contexts = harness.generator.contexts().await;
    assert_eq!(contexts[0].topics, vec!["lol let's talk about rust"]);
    assert_eq!(contexts[0].moods.get("alice"), Some(&Mood::Happy));

    let last = &contexts[2];
    assert_eq!(last.topics, vec!["lol let's talk about rust"]);
    assert_eq!(last.moods.get("alice"), Some(&Mood::Neutral));
    assert_eq!(last.moods.get("bob"), Some(&Mood::Angry));
    assert!(!last.moods.contains_key("codunot"));
}

#[tokio::test]
async fn blank_messages_are_ignored() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    assert_eq!(harness.send(&alice, "   ").await.unwrap(), HandleOutcome::Ignored);
    assert_eq!(alice.reply_count().await, 0);
    assert_eq!(harness.generator.call_count().await, 0);
}

#[tokio::test]
#[traced_test]
async fn daily_message_limit_denies_with_tier_text() {
    let harness = TestHarness::builder()
        .with_config(|c| c.tiers.basic.daily_messages = Limit::new(2))
        .build()
        .unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");

    for _ in 0..2 {
        assert!(matches!(
            harness.send(&alice, "hey").await.unwrap(),
            HandleOutcome::Replied(_)
        ));
    }
    let denied = harness.send(&alice, "hey").await.unwrap();
    assert_eq!(denied, HandleOutcome::Denied(ResourceKind::Messages));

    let reply = alice.last_reply().await.unwrap();
    assert!(reply.contains("**BASIC**"));
    assert!(reply.contains("`messages`"));
    assert_eq!(harness.generator.call_count().await, 2);
    assert_eq!(used(&harness, "g1", ResourceKind::Messages).await, 2);
    assert!(logs_contain("request denied by quota"));
}

#[tokio::test]
async fn attachment_denial_charges_nothing() {
    let harness = TestHarness::builder()
        .with_config(|c| c.tiers.basic.daily_attachments = Limit::new(1))
        .build()
        .unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");

    let ok = harness.send_with_attachments(&alice, "look", 1).await.unwrap();
    assert!(matches!(ok, HandleOutcome::Replied(_)));
    let denied = harness.send_with_attachments(&alice, "look again", 2).await.unwrap();
    assert_eq!(denied, HandleOutcome::Denied(ResourceKind::Attachments));

    assert_eq!(used(&harness, "g1", ResourceKind::Messages).await, 1);
    assert_eq!(used(&harness, "g1", ResourceKind::Attachments).await, 1);
}

#[tokio::test]
async fn direct_messages_are_charged_per_channel() {
    let harness = TestHarness::builder()
        .with_config(|c| c.tiers.basic.daily_messages = Limit::new(1))
        .build()
        .unwrap();
    let first = MockSubject::direct("dm1", "alice");
    let second = MockSubject::direct("dm2", "alice");

    assert!(matches!(harness.send(&first, "a").await.unwrap(), HandleOutcome::Replied(_)));
    assert!(matches!(harness.send(&second, "b").await.unwrap(), HandleOutcome::Replied(_)));
    assert_eq!(
        harness.send(&first, "c").await.unwrap(),
        HandleOutcome::Denied(ResourceKind::Messages)
    );
}

#[tokio::test]
async fn owners_and_privileged_authors_bypass_limits() {
    let harness = TestHarness::builder()
        .with_owner("boss")
        .with_config(|c| c.tiers.basic.daily_messages = Limit::new(0))
        .build()
        .unwrap();

    let boss = MockSubject::guild("g1", "c1", "boss");
    let admin = MockSubject::guild("g1", "c1", "admin").privileged();
    let pleb = MockSubject::guild("g1", "c1", "pleb");

    assert!(matches!(harness.send(&boss, "hi").await.unwrap(), HandleOutcome::Replied(_)));
    assert!(matches!(harness.send(&admin, "hi").await.unwrap(), HandleOutcome::Replied(_)));
    assert_eq!(
        harness.send(&pleb, "hi").await.unwrap(),
        HandleOutcome::Denied(ResourceKind::Messages)
    );
    assert_eq!(used(&harness, "g1", ResourceKind::Messages).await, 0);
}

#[tokio::test]
async fn gold_tier_has_no_message_ceiling() {
    let harness = TestHarness::builder().with_gold("g1").build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    for _ in 0..60 {
        let outcome = harness.send(&alice, "again").await.unwrap();
        assert!(matches!(outcome, HandleOutcome::Replied(_)));
    }
    assert_eq!(used(&harness, "g1", ResourceKind::Messages).await, 60);
}

#[tokio::test]
async fn generation_failure_still_charges_quota() {
    let harness = TestHarness::builder().build().unwrap();
    for _ in 0..3 {
        harness.generator.push_failure("upstream 503").await;
    }
    let alice = MockSubject::guild("g1", "c1", "alice");

    let outcome = harness.send(&alice, "hello").await.unwrap();
    assert_eq!(outcome, HandleOutcome::GenerationFailed);
    assert_eq!(alice.last_reply().await.as_deref(), Some(GENERATION_FAILED_REPLY));
    assert_eq!(harness.generator.call_count().await, 3);
    assert_eq!(used(&harness, "g1", ResourceKind::Messages).await, 1);

    let state = harness.state.lock().await;
    assert_eq!(state.channels.recent(&alice_channel(), 5), vec!["alice: hello"]);
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let harness = TestHarness::builder().build().unwrap();
    harness.generator.push_failure("blip").await;
    harness.generator.push_reply("recovered").await;
    let alice = MockSubject::guild("g1", "c1", "alice");

    let outcome = harness.send(&alice, "hello").await.unwrap();
    assert_eq!(outcome, HandleOutcome::Replied("recovered".to_string()));
    assert_eq!(used(&harness, "g1", ResourceKind::Messages).await, 1);
}

#[tokio::test]
async fn failed_reply_surfaces_channel_error() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    alice.fail_replies();
    let err = harness.send(&alice, "hello").await.unwrap_err();
    assert!(matches!(err, CodunotError::Channel { .. }));
}

#[tokio::test]
async fn mode_command_switches_persona() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");

    assert_eq!(harness.send(&alice, "!mode serious").await.unwrap(), HandleOutcome::Command);
    assert_eq!(alice.last_reply().await.as_deref(), Some("✅ Mode set to **serious**."));

    harness.send(&alice, "explain borrowing").await.unwrap();
    let context = harness.generator.contexts().await.pop().unwrap();
    assert_eq!(context.mode, Mode::Serious);
    assert_eq!(context.roast_target, None);

    harness.send(&alice, "!mode").await.unwrap();
    let listing = alice.last_reply().await.unwrap();
    assert!(listing.starts_with("Current mode: **serious**."));
    assert!(listing.contains("default, serious, roast, code, game"));
}

#[tokio::test]
async fn unknown_mode_is_rejected() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    harness.send(&alice, "!mode pirate").await.unwrap();
    assert!(alice.last_reply().await.unwrap().starts_with("❌ Unknown mode `pirate`."));
    let state = harness.state.lock().await;
    assert_eq!(state.channels.get_mode(&alice_channel()), Mode::Default);
}

#[tokio::test]
async fn roast_target_flows_into_prompt_until_mode_changes() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");

    harness.send(&alice, "!roast Dave").await.unwrap();
    assert_eq!(
        alice.last_reply().await.as_deref(),
        Some("🔥 Roast target locked: **Dave**.")
    );

    harness.send(&alice, "go on").await.unwrap();
    let context = harness.generator.contexts().await.pop().unwrap();
    assert_eq!(context.mode, Mode::Roast);
    assert_eq!(context.roast_target.as_deref(), Some("Dave"));

    harness.send(&alice, "!mode code").await.unwrap();
    {
        let state = harness.state.lock().await;
        assert_eq!(state.channels.get_target(&alice_channel()), None);
    }

    harness.send(&alice, "!unroast").await.unwrap();
    assert_eq!(alice.last_reply().await.as_deref(), Some("No roast target set."));
}

#[tokio::test]
async fn unroast_reports_cleared_target() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    harness.send(&alice, "!roast Dave").await.unwrap();
    harness.send(&alice, "!unroast").await.unwrap();
    assert_eq!(
        alice.last_reply().await.as_deref(),
        Some("Roast target **Dave** cleared.")
    );
}

#[tokio::test]
async fn commands_are_free_and_stay_out_of_history() {
    let harness = TestHarness::builder()
        .with_config(|c| c.tiers.basic.daily_messages = Limit::new(1))
        .build()
        .unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");

    harness.send(&alice, "!usage").await.unwrap();
    harness.send(&alice, "!mode").await.unwrap();
    assert!(matches!(harness.send(&alice, "hi").await.unwrap(), HandleOutcome::Replied(_)));

    let state = harness.state.lock().await;
    assert_eq!(state.channels.history_len(&alice_channel()), 2);
}

#[tokio::test]
async fn usage_command_reports_standing() {
    let harness = TestHarness::builder().with_owner("boss").build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    harness.send(&alice, "hello").await.unwrap();

    harness.send(&alice, "!usage").await.unwrap();
    let report = alice.last_reply().await.unwrap();
    assert!(report.contains("Usage for `g1` (**BASIC**)"));
    assert!(report.contains("messages today: 1/50"));
    assert!(report.contains("attachments (last 60 days): 0/30"));
    assert!(!report.contains("owner"));

    let boss = MockSubject::guild("g1", "c1", "boss");
    harness.send(&boss, "!usage").await.unwrap();
    assert!(boss.last_reply().await.unwrap().ends_with("(owner: limits bypassed)\n"));
}

#[tokio::test]
async fn save_writes_only_dirty_state() {
    let harness = TestHarness::builder().with_persistence().build().unwrap();
    assert_eq!(harness.state.save().await.unwrap(), SaveSummary::default());

    let alice = MockSubject::guild("g1", "c1", "alice");
    harness.send(&alice, "hello").await.unwrap();
    let summary = harness.state.save().await.unwrap();
    assert_eq!(
        summary,
        SaveSummary {
            usage: true,
            channels: true
        }
    );
    assert!(harness.file("daily_usage.json").exists());
    assert!(harness.file("channel_state.json").exists());
    assert_eq!(harness.state.save().await.unwrap(), SaveSummary::default());
}

#[tokio::test]
async fn channel_state_stays_in_memory_without_persistence() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    harness.send(&alice, "hello").await.unwrap();

    let summary = harness.state.save().await.unwrap();
    assert!(summary.usage);
    assert!(!summary.channels);
    assert!(!harness.file("channel_state.json").exists());
}

#[tokio::test]
async fn state_survives_restart() {
    let harness = TestHarness::builder().with_persistence().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    harness.send(&alice, "!roast Dave").await.unwrap();
    harness.send(&alice, "hello").await.unwrap();
    harness.state.save().await.unwrap();
    let dir = harness.into_dir();

    let reloaded = TestHarness::builder()
        .with_persistence()
        .in_dir(dir)
        .build()
        .unwrap();
    assert_eq!(used(&reloaded, "g1", ResourceKind::Messages).await, 1);
    let state = reloaded.state.lock().await;
    assert_eq!(
        state.channels.recent(&alice_channel(), 5),
        vec!["alice: hello", "codunot: mock reply"]
    );
    assert_eq!(state.channels.get_mode(&alice_channel()), Mode::Roast);
    assert_eq!(state.channels.get_target(&alice_channel()), Some("Dave"));
}

#[tokio::test]
async fn autosave_performs_final_save_on_cancel() {
    let harness = TestHarness::builder().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    harness.send(&alice, "hello").await.unwrap();

    let cancel = CancellationToken::new();
    let handle = spawn_autosave(harness.state.clone(), Duration::from_secs(3600), cancel.clone());
    cancel.cancel();
    handle.await.unwrap();

    assert!(harness.file("daily_usage.json").exists());
    assert!(harness.file("total_usage.json").exists());
    assert!(!harness.state.lock().await.usage.is_dirty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_saves_leave_latest_counts_on_disk() {
    let harness = TestHarness::builder().with_persistence().build().unwrap();
    let alice = MockSubject::guild("g1", "c1", "alice");
    harness.send(&alice, "one").await.unwrap();

    for round in 0..10 {
        let (first, second, third) = tokio::join!(
            harness.state.save(),
            async {
                harness.send(&alice, "more").await.unwrap();
                harness.state.save().await
            },
            harness.state.save(),
        );
        first.unwrap();
        second.unwrap();
        third.unwrap();

        let on_disk = codunot_usage::UsageFiles::load(
            &harness.file("daily_usage.json"),
            &harness.file("total_usage.json"),
        );
        let stored = on_disk.daily[&EntityKey::from("g1")].messages;
        assert_eq!(stored, used(&harness, "g1", ResourceKind::Messages).await, "round {round}");
        assert_eq!(harness.state.save().await.unwrap(), SaveSummary::default());
    }
}
