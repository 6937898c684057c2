use std::sync::Arc;

use asnscope_common::config::OutputDestination;

use crate::support::*;

fn registry() -> FakeRegistry {
    FakeRegistry::new()
        .asn("AS64500", &["192.0.2.0/24", "198.51.100.0/24"])
        .prefix(
            "192.0.2.0/24",
            &["192.0.2.10", "192.0.2.11"],
            &["www.example.com", "api.example.com"],
        )
        .prefix("198.51.100.0/24", &["198.51.100.7"], &["mail.example.com"])
}

#[tokio::test]
async fn shared_files_collect_every_prefix() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let paths = shared_paths(dir.path());
    std::fs::write(&paths.domains_path, "left.over.example\n")?;

    let (scanner, _rx) = scanner_for(Arc::new(registry()));
    scanner.configure(run_config(&["AS64500"], 2, dir.path()))?;
    scanner.start()?;
    wait_for_end(&scanner).await;

    let mut domains = read_lines(&paths.domains_path);
    domains.sort();
    assert_eq!(
        domains,
        vec!["api.example.com", "mail.example.com", "www.example.com"]
    );

    let mut ips = read_lines(&paths.ips_path);
    ips.sort();
    assert_eq!(ips, vec!["192.0.2.10", "192.0.2.11", "198.51.100.7"]);

    Ok(())
}

#[tokio::test]
async fn batches_from_one_prefix_stay_together() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let (scanner, _rx) = scanner_for(Arc::new(registry()));
    scanner.configure(run_config(&["AS64500"], 4, dir.path()))?;
    scanner.start()?;
    wait_for_end(&scanner).await;

    let domains = read_lines(&shared_paths(dir.path()).domains_path);
    let www = domains.iter().position(|d| d == "www.example.com");
    let api = domains.iter().position(|d| d == "api.example.com");
    assert_eq!(api, www.map(|i| i + 1));

    Ok(())
}

#[tokio::test]
async fn per_prefix_mode_writes_one_pair_per_prefix() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("by-prefix");

    let mut config = run_config(&["AS64500", "203.0.113.5"], 3, dir.path());
    config.output = OutputDestination::PerPrefix { dir: out.clone() };

    let registry = registry().prefix("203.0.113.5/32", &["203.0.113.5"], &[]);
    let (scanner, _rx) = scanner_for(Arc::new(registry));
    scanner.configure(config)?;
    scanner.start()?;
    wait_for_end(&scanner).await;

    assert_eq!(
        read_lines(&out.join("domains_192.0.2.0_24.txt")),
        vec!["www.example.com", "api.example.com"]
    );
    assert_eq!(
        read_lines(&out.join("ips_198.51.100.0_24.txt")),
        vec!["198.51.100.7"]
    );
    assert_eq!(read_lines(&out.join("ips_203.0.113.5_32.txt")), vec!["203.0.113.5"]);
    assert!(!out.join("domains_203.0.113.5_32.txt").exists());
    assert!(!shared_paths(dir.path()).domains_path.exists());

    Ok(())
}
