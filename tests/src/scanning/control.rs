use std::sync::Arc;
use std::time::Duration;

use asnscope_core::scanner::tracker::Counters;
use asnscope_core::{EngineError, FinishReason, RunState};

use crate::support::*;

fn many_prefixes(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("10.{i}.0.0/16")).collect()
}

fn registry_with(asn: &str, prefixes: &[String]) -> FakeRegistry {
    let refs: Vec<&str> = prefixes.iter().map(String::as_str).collect();
    let mut registry = FakeRegistry::new().asn(asn, &refs);
    for prefix in &refs {
        registry = registry.prefix(prefix, &[], &["x.example"]);
    }
    registry
}

#[tokio::test]
async fn stop_abandons_queued_work() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let prefixes = many_prefixes(40);
    let registry = Arc::new(registry_with("AS64500", &prefixes).slow(Duration::from_millis(40)));
    let (scanner, mut rx) = scanner_for(registry.clone());

    scanner.configure(run_config(&["AS64500"], 1, dir.path()))?;
    scanner.start()?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(scanner.stop());
    assert_eq!(scanner.state(), RunState::Stopping);

    assert_eq!(
        wait_for_end(&scanner).await,
        RunState::Finished(FinishReason::Stopped)
    );

    let counters = scanner.snapshot().counters;
    assert!(counters.processed_prefixes < counters.total_prefixes);
    assert_eq!(counters.completed_targets, 0);
    assert_eq!(scanner.queued(), 0);

    // Scans that had already started were allowed to finish and were counted
    let scans_started = registry
        .calls()
        .iter()
        .filter(|c| c.ends_with("#_dnsrecords"))
        .count();
    assert!(scans_started > 0);
    assert_eq!(counters.processed_prefixes, scans_started);

    // Nothing new starts once the run has settled
    let calls = registry.calls().len();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(registry.calls().len(), calls);

    let events = drain(&mut rx);
    let lines = logs(&events);
    assert!(lines.contains(&"[!] Stop requested."));
    assert!(lines.iter().any(|l| l.starts_with("[■] Scan stopped.")));

    Ok(())
}

#[tokio::test]
async fn pause_holds_workers_until_resumed() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let prefixes = many_prefixes(12);
    let registry = Arc::new(registry_with("AS64500", &prefixes).slow(Duration::from_millis(20)));
    let (scanner, mut rx) = scanner_for(registry.clone());

    scanner.configure(run_config(&["AS64500"], 2, dir.path()))?;
    scanner.start()?;

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(scanner.pause());
    assert_eq!(scanner.state(), RunState::Paused);

    // Let fetches already in flight drain, then check nothing else starts
    tokio::time::sleep(Duration::from_millis(100)).await;
    let held = registry.calls().len();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(registry.calls().len(), held);
    assert!(scanner.snapshot().counters.completed_targets == 0);

    assert!(scanner.resume());
    assert_eq!(
        wait_for_end(&scanner).await,
        RunState::Finished(FinishReason::Completed)
    );
    assert_eq!(scanner.snapshot().counters.processed_prefixes, 12);

    let events = drain(&mut rx);
    let lines = logs(&events);
    assert!(lines.contains(&"[⏸] Paused."));
    assert!(lines.contains(&"[▶] Resumed."));

    Ok(())
}

#[tokio::test]
async fn stop_during_expansion_backoff_is_logged_as_cancelled() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = Arc::new(FakeRegistry::new().failing(prefixes_url("AS64500")));
    let mut timing = fast_timing();
    timing.retry.backoff = Duration::from_secs(5);
    let (scanner, mut rx) = scanner_with_timing(registry.clone(), timing);

    scanner.configure(run_config(&["AS64500"], 1, dir.path()))?;
    scanner.start()?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(scanner.stop());
    assert_eq!(
        wait_for_end(&scanner).await,
        RunState::Finished(FinishReason::Stopped)
    );

    assert_eq!(registry.calls_to(&prefixes_url("AS64500")), 1);
    assert_eq!(scanner.snapshot().counters.completed_targets, 1);

    let events = drain(&mut rx);
    let lines = logs(&events);
    assert!(lines.contains(&"[■] Expansion of AS64500 cancelled by stop."));
    assert!(!lines.iter().any(|l| l.starts_with("[!] No prefixes for")));

    Ok(())
}

#[tokio::test]
async fn toggle_pause_flips_between_states() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = Arc::new(registry_with("AS64500", &many_prefixes(4)).slow(Duration::from_millis(30)));
    let (scanner, _rx) = scanner_for(registry);

    scanner.configure(run_config(&["AS64500"], 1, dir.path()))?;
    scanner.start()?;

    assert!(scanner.toggle_pause());
    assert_eq!(scanner.state(), RunState::Paused);
    assert!(scanner.toggle_pause());
    assert_eq!(scanner.state(), RunState::Running);

    wait_for_end(&scanner).await;
    Ok(())
}

#[tokio::test]
async fn stop_while_paused_ends_the_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = Arc::new(registry_with("AS64500", &many_prefixes(8)).slow(Duration::from_millis(20)));
    let (scanner, _rx) = scanner_for(registry);

    scanner.configure(run_config(&["AS64500"], 2, dir.path()))?;
    scanner.start()?;
    assert!(scanner.pause());
    assert!(scanner.stop());

    assert_eq!(
        wait_for_end(&scanner).await,
        RunState::Finished(FinishReason::Stopped)
    );
    // A finished run cannot be paused or stopped again
    assert!(!scanner.pause());
    assert!(!scanner.stop());

    Ok(())
}

#[tokio::test]
async fn active_run_rejects_start_and_configure() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = Arc::new(registry_with("AS64500", &many_prefixes(4)).slow(Duration::from_millis(50)));
    let (scanner, _rx) = scanner_for(registry);

    scanner.configure(run_config(&["AS64500"], 1, dir.path()))?;
    scanner.start()?;

    assert!(matches!(scanner.start(), Err(EngineError::AlreadyRunning)));
    assert!(matches!(
        scanner.configure(run_config(&["AS1"], 1, dir.path())),
        Err(EngineError::Busy)
    ));

    scanner.stop();
    wait_for_end(&scanner).await;
    Ok(())
}

#[tokio::test]
async fn restart_resets_counters_and_registry() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = Arc::new(
        FakeRegistry::new()
            .asn("AS64500", &["192.0.2.0/24", "198.51.100.0/24"])
            .prefix("192.0.2.0/24", &["192.0.2.10"], &["www.example.com"])
            .prefix("198.51.100.0/24", &[], &[])
            .prefix("203.0.113.5/32", &["203.0.113.5"], &[]),
    );
    let (scanner, _rx) = scanner_for(registry);

    scanner.configure(run_config(&["AS64500"], 2, dir.path()))?;
    scanner.start()?;
    wait_for_end(&scanner).await;
    assert_eq!(scanner.snapshot().counters.total_prefixes, 2);

    scanner.configure(run_config(&["203.0.113.5"], 2, dir.path()))?;
    scanner.start()?;
    assert_eq!(
        wait_for_end(&scanner).await,
        RunState::Finished(FinishReason::Completed)
    );

    assert_eq!(
        scanner.snapshot().counters,
        Counters {
            total_targets: 1,
            completed_targets: 1,
            total_prefixes: 1,
            processed_prefixes: 1,
        }
    );
    assert_eq!(scanner.pending_for("AS64500"), None);

    // The shared files were reset for the second run
    let paths = shared_paths(dir.path());
    assert!(read_lines(&paths.domains_path).is_empty());
    assert_eq!(read_lines(&paths.ips_path), vec!["203.0.113.5"]);

    Ok(())
}
