//! # Scan Target Model
//!
//! Defines the seeds a scan starts from.
//!
//! A target is one token from the user's input and is either:
//! * A bare IPv4 host (e.g., `203.0.113.5`), scanned as a `/32` prefix.
//! * Anything else (e.g., `AS64500`), treated as an ASN label and passed
//!   verbatim to the lookup service.

use std::collections::HashSet;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

/// The two families of seed the engine knows how to expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// An autonomous system label, expanded into its announced prefixes.
    Asn,
    /// A single IPv4 address, scanned directly as a `/32`.
    Ipv4,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asn => write!(f, "ASN"),
            Self::Ipv4 => write!(f, "IPv4"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("target is blank")]
    Blank,
}

/// A seed identifier supplied by the caller.
///
/// The `key` is the exact token the user typed and is the identity used for
/// completion accounting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    key: String,
    kind: TargetKind,
}

impl Target {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// The trivial prefix a bare host is scanned as, `None` for ASNs.
    pub fn host_prefix(&self) -> Option<String> {
        match self.kind {
            TargetKind::Ipv4 => Some(format!("{}/32", self.key)),
            TargetKind::Asn => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl FromStr for Target {
    type Err = TargetError;

    /// Classifies a single token.
    ///
    /// Tokens that parse as a strict dotted-quad IPv4 address become
    /// [`TargetKind::Ipv4`]; every other non-blank token is an ASN.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            return Err(TargetError::Blank);
        }

        let kind = if is_dotted_quad(token) {
            TargetKind::Ipv4
        } else {
            TargetKind::Asn
        };

        Ok(Self {
            key: token.to_string(),
            kind,
        })
    }
}

fn is_dotted_quad(token: &str) -> bool {
    token.split('.').count() == 4 && token.parse::<Ipv4Addr>().is_ok()
}

/// Outcome of feeding a block of text into a [`TargetList`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineReport {
    pub added: usize,
    pub duplicates: Vec<String>,
    pub rejected: Vec<(String, TargetError)>,
}

/// An ordered set of targets, unique by key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TargetList {
    targets: Vec<Target>,
    keys: HashSet<String>,
}

impl TargetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one token per line, skipping blank lines.
    pub fn from_lines(text: &str) -> (Self, LineReport) {
        let mut list = Self::new();
        let report = list.extend_from_lines(text);
        (list, report)
    }

    /// Appends a target unless its key is already present.
    ///
    /// Returns `false` when the target was a duplicate.
    pub fn push(&mut self, target: Target) -> bool {
        if !self.keys.insert(target.key.clone()) {
            return false;
        }
        self.targets.push(target);
        true
    }

    pub fn extend_from_lines(&mut self, text: &str) -> LineReport {
        let mut report = LineReport::default();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match Target::from_str(line) {
                Ok(target) => {
                    if self.push(target) {
                        report.added += 1;
                    } else {
                        report.duplicates.push(line.to_string());
                    }
                }
                Err(e) => report.rejected.push((line.to_string(), e)),
            }
        }

        report
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn count_of(&self, kind: TargetKind) -> usize {
        self.targets.iter().filter(|t| t.kind == kind).count()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
