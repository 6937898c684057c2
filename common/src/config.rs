use std::path::{Path, PathBuf};

use crate::network::target::TargetList;

pub const DEFAULT_THREADS: usize = 50;
pub const MAX_THREADS: usize = 2048;
pub const DEFAULT_BASE_URL: &str = "https://bgp.he.net";
pub const DEFAULT_DOMAINS_FILE: &str = "domains_all.txt";
pub const DEFAULT_IPS_FILE: &str = "ips_all.txt";

/// Presentation settings for the terminal front end.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Skips the banner line printed at startup.
    pub no_banner: bool,
    /// 1 hides headers, 2 additionally hides per-record log lines.
    pub quiet: u8,
    /// Disables the pause/stop key listener.
    ///
    /// Ctrl-C still stops the scan.
    pub disable_input: bool,
}

/// The pair of files records are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub domains_path: PathBuf,
    pub ips_path: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            domains_path: PathBuf::from(DEFAULT_DOMAINS_FILE),
            ips_path: PathBuf::from(DEFAULT_IPS_FILE),
        }
    }
}

/// Where a run writes the records it discovers.
///
/// Chosen once per run and never changed while it is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDestination {
    /// Every prefix appends to the same two files.
    Single(OutputPaths),
    /// Each prefix gets its own `domains_<prefix>.txt` / `ips_<prefix>.txt`
    /// inside `dir`, with `/` replaced by `_`.
    PerPrefix { dir: PathBuf },
}

impl Default for OutputDestination {
    fn default() -> Self {
        Self::Single(OutputPaths::default())
    }
}

impl OutputDestination {
    pub fn new(single_output_file: bool, paths: OutputPaths, dir: impl AsRef<Path>) -> Self {
        if single_output_file {
            Self::Single(paths)
        } else {
            Self::PerPrefix {
                dir: dir.as_ref().to_path_buf(),
            }
        }
    }

    /// Resolves the files the records of `prefix` belong in.
    pub fn paths_for(&self, prefix: &str) -> OutputPaths {
        match self {
            Self::Single(paths) => paths.clone(),
            Self::PerPrefix { dir } => {
                let stem = prefix_file_stem(prefix);
                OutputPaths {
                    domains_path: dir.join(format!("domains_{stem}.txt")),
                    ips_path: dir.join(format!("ips_{stem}.txt")),
                }
            }
        }
    }
}

pub fn prefix_file_stem(prefix: &str) -> String {
    prefix.replace('/', "_")
}

/// Everything the engine needs to know before a run starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub targets: TargetList,
    pub threads: usize,
    pub proxies: Vec<String>,
    pub output: OutputDestination,
    pub base_url: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            targets: TargetList::new(),
            threads: DEFAULT_THREADS,
            proxies: Vec::new(),
            output: OutputDestination::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl RunConfig {
    pub fn new(targets: TargetList) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }
}
