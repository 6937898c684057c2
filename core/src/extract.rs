//! Turning lookup pages into prefixes and host records.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Hosts found inside one prefix, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Records {
    pub ips: Vec<String>,
    pub domains: Vec<String>,
}

impl Records {
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.domains.is_empty()
    }
}

/// Parses the two kinds of lookup page.
///
/// Extraction is total: a page that does not look like what was asked for
/// simply yields nothing.
pub trait PageExtractor: Send + Sync {
    fn extract_prefixes(&self, page: &str) -> BTreeSet<String>;
    fn extract_records(&self, page: &str) -> Records;
}

static PREFIX_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tr td a[href^='/net/']").expect("valid selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table tr").expect("valid selector"));
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));

static PREFIX_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/net/(\d+\.\d+\.\d+\.\d+/\d+)").expect("valid regex"));
static IP_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+").expect("valid regex"));
static DOTTED_QUAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("valid regex"));

/// Extractor for the `bgp.he.net` page layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeNetExtractor;

impl PageExtractor for HeNetExtractor {
    fn extract_prefixes(&self, page: &str) -> BTreeSet<String> {
        let document = Html::parse_document(page);

        document
            .select(&PREFIX_LINK)
            .filter_map(|link| link.value().attr("href"))
            .filter_map(|href| PREFIX_HREF.captures(href))
            .map(|caps| caps[1].to_string())
            .collect()
    }

    fn extract_records(&self, page: &str) -> Records {
        let document = Html::parse_document(page);
        let mut records = Records::default();

        for row in document.select(&ROW) {
            let cells: Vec<ElementRef> = row.select(&CELL).collect();
            if cells.len() < 3 {
                continue;
            }

            if let Some(ip) = cells[0].select(&LINK).next().map(link_text) {
                if IP_PREFIX.is_match(&ip) {
                    records.ips.push(ip);
                }
            }

            records.domains.extend(
                cells[2]
                    .select(&LINK)
                    .map(link_text)
                    .filter(|text| !text.is_empty() && !DOTTED_QUAD.is_match(text)),
            );
        }

        records
    }
}

fn link_text(link: ElementRef<'_>) -> String {
    link.text().collect::<String>().trim().to_string()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
