use asnscope_common::config::Config;
use asnscope_common::network::target::TargetKind;
use asnscope_common::{info, success, warn};
use colored::*;

use crate::aprint;
use crate::commands::TargetInput;
use crate::terminal::{colors, print};

type Detail = (String, ColoredString);

/// Shows how each target would be seeded, without touching the network.
pub fn targets(input: TargetInput, cfg: &Config) -> anyhow::Result<()> {
    let (targets, report) = input.load()?;

    print::header("parsed targets", cfg.quiet);
    if cfg.quiet == 0 {
        info!("Targets are only parsed here, nothing is fetched");
    }

    if targets.is_empty() {
        warn!("No input detected. Add ASNs/IPs (one per line).");
        return Ok(());
    }

    for (idx, target) in targets.iter().enumerate() {
        if cfg.quiet < 2 {
            print::tree_head(idx, target.key());
            print::as_tree_one_level(target_details(target.kind(), target.host_prefix()));
        }
        if idx + 1 != targets.len() && cfg.quiet == 0 {
            aprint!();
        }
    }

    success!(
        "{} targets ready: {} ASN, {} IPv4 ({} duplicates, {} rejected)",
        targets.len(),
        targets.count_of(TargetKind::Asn),
        targets.count_of(TargetKind::Ipv4),
        report.duplicates.len(),
        report.rejected.len()
    );
    Ok(())
}

fn target_details(kind: TargetKind, host_prefix: Option<String>) -> Vec<Detail> {
    match (kind, host_prefix) {
        (TargetKind::Ipv4, Some(prefix)) => vec![
            ("Kind".to_string(), kind.to_string().color(colors::IPV4_ADDR)),
            ("Scan".to_string(), prefix.color(colors::TEXT_DEFAULT)),
        ],
        _ => vec![
            ("Kind".to_string(), kind.to_string().color(colors::ASN)),
            ("Scan".to_string(), "announced prefixes".color(colors::TEXT_DEFAULT)),
        ],
    }
}
