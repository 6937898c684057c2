pub mod scan;
pub mod targets;

use std::path::{Path, PathBuf};

use anyhow::Context;
use asnscope_common::config::{
    DEFAULT_BASE_URL, DEFAULT_DOMAINS_FILE, DEFAULT_IPS_FILE, DEFAULT_THREADS, OutputDestination,
    OutputPaths,
};
use asnscope_common::network::target::{LineReport, TargetList};
use asnscope_common::warn;
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "asnscope")]
#[command(version, about = "Expands ASNs and IPv4 hosts into prefixes, IPs and domains.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Reduce output. Once hides headers, twice also hides per-domain lines
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Print internal diagnostics. Repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover prefixes, IPs and domains for a set of targets
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Parse targets and show how they would be scanned
    #[command(alias = "t")]
    Targets(TargetInput),
}

#[derive(Args)]
pub struct TargetInput {
    /// ASNs (e.g. AS64500) or IPv4 hosts (e.g. 203.0.113.5)
    pub targets: Vec<String>,

    /// Read additional targets from a file, one per line
    #[arg(short = 'f', long, value_name = "FILE")]
    pub targets_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub input: TargetInput,

    /// Proxies to spread requests across, one per line (host:port or URL)
    #[arg(short, long, value_name = "FILE")]
    pub proxies_file: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Write one pair of files per prefix instead of two shared files
    #[arg(long)]
    pub per_prefix: bool,

    /// Shared domains file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_DOMAINS_FILE)]
    pub domains_out: PathBuf,

    /// Shared IPs file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_IPS_FILE)]
    pub ips_out: PathBuf,

    /// Directory for per-prefix files
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Lookup service root
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Do not listen for pause/stop keys
    #[arg(long)]
    pub no_input: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl TargetInput {
    /// Collects targets from the arguments, then from the file.
    pub fn load(&self) -> anyhow::Result<(TargetList, LineReport)> {
        let (mut targets, mut report) = TargetList::from_lines(&self.targets.join("\n"));

        if let Some(path) = &self.targets_file {
            let text = read_lines_file(path, "targets")?;
            let from_file = targets.extend_from_lines(&text);
            report.added += from_file.added;
            report.duplicates.extend(from_file.duplicates);
            report.rejected.extend(from_file.rejected);
        }

        for duplicate in &report.duplicates {
            warn!("Ignoring duplicate target {duplicate}");
        }
        for (token, e) in &report.rejected {
            warn!("Ignoring target '{token}': {e}");
        }

        Ok((targets, report))
    }
}

impl ScanArgs {
    pub fn destination(&self) -> OutputDestination {
        let paths = OutputPaths {
            domains_path: self.domains_out.clone(),
            ips_path: self.ips_out.clone(),
        };
        OutputDestination::new(!self.per_prefix, paths, &self.out_dir)
    }

    pub fn load_proxies(&self) -> anyhow::Result<Vec<String>> {
        let Some(path) = &self.proxies_file else {
            return Ok(Vec::new());
        };

        let text = read_lines_file(path, "proxies")?;
        Ok(parse_proxies(&text))
    }
}

fn read_lines_file(path: &Path, what: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} file '{}'", path.display()))
}

fn parse_proxies(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
