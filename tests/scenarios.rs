//! End-to-end scenarios driving the library with in-memory collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{text_message, FakeChannel, FakeChecker, FakeLinks, Workspace};
use linkshield::alerts::AlertManager;
use linkshield::interpreter::CommandInterpreter;
use linkshield::remediation::{RemediationOutcome, Remediator};
use linkshield::runtime::{Collaborators, Orchestrator};
use linkshield::scheduler::{MonitorScheduler, MonitorSettings};
use linkshield::signal::ShutdownToken;

const BACKUPS: &str = "old domain : a.test, new domain : a-backup.test\n";

struct Harness {
    ws: Workspace,
    checker: Arc<FakeChecker>,
    links: Arc<FakeLinks>,
    channel: Arc<FakeChannel>,
    scheduler: MonitorScheduler,
    remediator: Remediator,
}

fn harness(ws: Workspace, checker: FakeChecker, links: FakeLinks) -> Harness {
    let state = ws.state();
    let checker = Arc::new(checker);
    let links = Arc::new(links);
    let channel = Arc::new(FakeChannel::default());

    let alerts = AlertManager::new(channel.clone(), state.clone());
    let remediator = Remediator::new(
        state.clone(),
        links.clone(),
        alerts.clone(),
        "Automatic domain replacement",
    );
    let scheduler = MonitorScheduler::new(
        state,
        checker.clone(),
        remediator.clone(),
        alerts,
        MonitorSettings::default(),
    );

    Harness {
        ws,
        checker,
        links,
        channel,
        scheduler,
        remediator,
    }
}

#[tokio::test]
async fn blocked_domain_is_remediated() {
    let h = harness(
        Workspace::new("a.test\nb.test\n", BACKUPS, Some("42")),
        FakeChecker::blocking(&["a.test"]),
        FakeLinks::with_targets(&[("x1", "https://a.test/x")]),
    );

    let report = h.scheduler.tick(&ShutdownToken::new()).await.unwrap();

    assert_eq!(report.blocked, vec!["a.test"]);
    assert!(!report.heartbeat_sent);
    assert_eq!(h.links.target_of("x1").unwrap(), "https://a-backup.test/x");
    assert_eq!(h.ws.read("list.txt"), "a-backup.test\nb.test\n");

    let sent = h.channel.sent();
    assert!(sent.iter().all(|(to, _)| to == "42"));
    assert!(sent[0].1.contains("Domain blocked: a.test"));
    assert_eq!(h.channel.sent_containing("Domain list updated").len(), 1);
    assert!(h.channel.sent_containing("All domains clear").is_empty());
}

#[tokio::test]
async fn blocked_domain_without_backup_is_left_alone() {
    let h = harness(
        Workspace::new("a.test\nb.test\n", "", Some("42")),
        FakeChecker::blocking(&["a.test"]),
        FakeLinks::with_targets(&[("x1", "https://a.test/x")]),
    );

    h.scheduler.tick(&ShutdownToken::new()).await.unwrap();

    assert_eq!(h.channel.sent_containing("No backup found for a.test").len(), 1);
    assert_eq!(h.ws.read("list.txt"), "a.test\nb.test\n");
    assert!(h.links.patches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn remediation_is_idempotent() {
    let h = harness(
        Workspace::new("a.test\nb.test\n", BACKUPS, Some("42")),
        FakeChecker::default(),
        FakeLinks::with_targets(&[("x1", "https://a.test/x"), ("x2", "https://b.test/y")]),
    );

    let token = ShutdownToken::new();
    let first = h.remediator.remediate("a.test", &token).await;
    assert!(matches!(first, RemediationOutcome::Remediated { patched: 1, .. }));
    let list_after_first = h.ws.read("list.txt");

    let second = h.remediator.remediate("a.test", &token).await;
    assert!(matches!(second, RemediationOutcome::NothingPatched { .. }));
    assert_eq!(h.ws.read("list.txt"), list_after_first);
    assert_eq!(h.links.patches.lock().unwrap().len(), 1);
    assert_eq!(h.channel.sent_containing("Domain list updated").len(), 1);
}

#[tokio::test]
async fn partial_patch_failure_still_updates_list() {
    let h = harness(
        Workspace::new("a.test\n", BACKUPS, Some("42")),
        FakeChecker::default(),
        FakeLinks::with_targets(&[("x1", "https://a.test/1"), ("x2", "https://a.test/2")]),
    );
    h.links.fail_patch("x1");
    let token = ShutdownToken::new();

    let outcome = h.remediator.remediate("a.test", &token).await;

    assert!(matches!(
        outcome,
        RemediationOutcome::Remediated {
            patched: 1,
            failed: 1,
            ..
        }
    ));
    assert_eq!(h.links.target_of("x1").unwrap(), "https://a.test/1");
    assert_eq!(h.links.target_of("x2").unwrap(), "https://a-backup.test/2");
    assert_eq!(h.ws.read("list.txt"), "a-backup.test\n");
    assert_eq!(h.channel.sent_containing("Failed to update short link x1").len(), 1);
}

#[tokio::test]
async fn blocked_domain_suppresses_heartbeat() {
    let h = harness(
        Workspace::new("a.test\nb.test\nc.test\n", "", Some("42")),
        FakeChecker::blocking(&["c.test"]),
        FakeLinks::default(),
    );
    let token = ShutdownToken::new();

    let report = h.scheduler.tick(&token).await.unwrap();
    assert!(!report.heartbeat_sent);
    assert!(h.channel.sent_containing("All domains clear").is_empty());

    // Heartbeat is still due once the block clears
    h.checker.unblock("c.test");
    let report = h.scheduler.tick(&token).await.unwrap();
    assert!(report.heartbeat_sent);
    assert_eq!(h.channel.sent_containing("All domains clear").len(), 1);

    let report = h.scheduler.tick(&token).await.unwrap();
    assert!(!report.heartbeat_sent);
}

#[tokio::test]
async fn batches_cover_list_in_order() {
    let domains: Vec<String> = (0..12).map(|i| format!("d{}.test", i)).collect();
    let list = domains.iter().map(|d| format!("{}\n", d)).collect::<String>();
    let h = harness(
        Workspace::new(&list, "", None),
        FakeChecker::default(),
        FakeLinks::default(),
    );

    let report = h.scheduler.tick(&ShutdownToken::new()).await.unwrap();

    assert_eq!(report.batches, 3);
    let batches = h.checker.batches.lock().unwrap();
    assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![5, 5, 2]);
    assert_eq!(batches.concat(), domains);
}

#[tokio::test]
async fn register_then_alerts_target_sender() {
    let ws = Workspace::new("a.test\n", BACKUPS, None);
    let state = ws.state();
    let channel = Arc::new(FakeChannel::default());
    let interpreter =
        CommandInterpreter::new(state.clone(), channel.clone(), Duration::from_millis(1));

    interpreter
        .handle(&text_message(1, "42", "/register"))
        .await
        .unwrap();
    assert_eq!(ws.read("recipient.txt"), "42");

    let alerts = AlertManager::new(channel.clone(), state);
    alerts
        .emit(linkshield::alerts::AlertTypes::domain_blocked("a.test"))
        .await;

    let sent = channel.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].0, "42");
}

#[tokio::test]
async fn replace_absent_domain_leaves_file_untouched() {
    let original = "a.test\r\nb.test";
    let ws = Workspace::new(original, "", None);
    let channel = Arc::new(FakeChannel::default());
    let interpreter = CommandInterpreter::new(ws.state(), channel, Duration::from_millis(1));

    let reply = interpreter
        .handle(&text_message(1, "7", "/replace z.test y.test"))
        .await
        .unwrap();

    assert!(reply.contains("not found"));
    assert_eq!(ws.read("list.txt"), original);
}

#[tokio::test]
async fn orchestrator_serves_commands_while_monitoring() {
    let ws = Workspace::new("a.test\nb.test\n", BACKUPS, None);
    let checker = Arc::new(FakeChecker::default());
    let channel = Arc::new(FakeChannel::default());
    channel.queue(vec![text_message(10, "42", "/register")]);
    channel.queue(vec![text_message(11, "42", "/replace b.test c.test")]);
    channel.queue(vec![text_message(12, "42", "/list")]);

    let orchestrator = Orchestrator::new(
        ws.state(),
        Collaborators {
            checker: checker.clone(),
            links: Arc::new(FakeLinks::default()),
            channel: channel.clone(),
        },
        MonitorSettings::default(),
        "Automatic domain replacement",
        Duration::from_millis(5),
    );

    let token = ShutdownToken::new();
    let stopper = {
        let token = token.clone();
        let channel = channel.clone();
        async move {
            while channel.sent_containing("Tracked domains").is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            token.cancel();
        }
    };

    tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(orchestrator.run(&token), stopper);
    })
    .await
    .unwrap();

    assert_eq!(ws.read("recipient.txt"), "42");
    assert_eq!(ws.read("list.txt"), "a.test\nc.test\n");
    let listing = channel.sent_containing("Tracked domains");
    assert!(listing[0].1.contains("a.test\nc.test"));
    let offsets = channel.offsets.lock().unwrap().clone();
    assert_eq!(&offsets[..3], &[None, Some(11), Some(12)]);
    assert!(!checker.batches.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_remediation_stops_after_current_patch() {
    let ws = Workspace::new("a.test\n", BACKUPS, Some("42"));
    let targets: Vec<(String, String)> = (0..20)
        .map(|i| (format!("x{}", i), format!("https://a.test/{}", i)))
        .collect();
    let targets: Vec<(&str, &str)> = targets
        .iter()
        .map(|(id, target)| (id.as_str(), target.as_str()))
        .collect();
    let links = Arc::new(FakeLinks {
        patch_delay: Some(Duration::from_secs(10)),
        ..FakeLinks::with_targets(&targets)
    });

    let orchestrator = Orchestrator::new(
        ws.state(),
        Collaborators {
            checker: Arc::new(FakeChecker::blocking(&["a.test"])),
            links: links.clone(),
            channel: Arc::new(FakeChannel::default()),
        },
        MonitorSettings::default(),
        "Automatic domain replacement",
        Duration::from_secs(1),
    );

    let token = ShutdownToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        canceller.cancel();
    });

    let started = tokio::time::Instant::now();
    orchestrator.run(&token).await;

    assert!(started.elapsed() <= Duration::from_secs(10));
    assert_eq!(links.patches.lock().unwrap().len(), 1);
    assert_eq!(links.target_of("x0").unwrap(), "https://a-backup.test/0");
    assert_eq!(links.target_of("x1").unwrap(), "https://a.test/1");
    assert_eq!(ws.read("list.txt"), "a-backup.test\n");
}
