//! HTML extraction for leaderboard and athlete profile pages.
//!
//! Pure functions over page source. Extraction is best effort: a field that
//! cannot be located is left as `"N/A"` (identity fields) or blank (rank and
//! benchmarks), never an error.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Benchmarks read from the profile stats table, in output column order.
pub const BENCHMARKS: [&str; 15] = [
    "Back Squat",
    "Chad1000x",
    "Clean and Jerk",
    "Deadlift",
    "Fight Gone Bad",
    "Filthy 50",
    "Fran",
    "Grace",
    "Helen",
    "L1 Benchmark",
    "Max Pull-ups",
    "Murph",
    "Run 5k",
    "Snatch",
    "Sprint 400m",
];

pub const NOT_AVAILABLE: &str = "N/A";

/// Column key for a benchmark: lowercase, spaces and hyphens removed.
pub fn benchmark_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// One harvested athlete.
#[derive(Debug, Clone, PartialEq)]
pub struct AthleteRecord {
    pub profile_url: String,
    pub name: String,
    pub country: String,
    pub gender: String,
    /// Worldwide Open rank for the configured year, digits only.
    pub open_rank: String,
    /// Values parallel to [`BENCHMARKS`].
    pub benchmarks: Vec<String>,
}

impl AthleteRecord {
    pub fn benchmark(&self, name: &str) -> Option<&str> {
        BENCHMARKS
            .iter()
            .position(|b| *b == name)
            .and_then(|i| self.benchmarks.get(i))
            .map(String::as_str)
    }
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($re).expect("valid regex"))
        }
    };
}

pattern!(anchor_re, r#"(?is)<a\b([^>]*)>(.*?)</a>"#);
pattern!(href_re, r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#);
pattern!(tag_re, r"(?s)<[^>]*>");
pattern!(space_re, r"\s+");
pattern!(
    name_block_re,
    r#"(?i)class\s*=\s*"[^"]*\bathlete-name\b[^"]*""#
);
pattern!(heading_re, r"(?is)<h1\b[^>]*>(.*?)</h1>");
pattern!(span_re, r"(?is)<span\b[^>]*>(.*?)</span>");
pattern!(
    country_re,
    r#"(?is)<span\b[^>]*class\s*=\s*"[^"]*\bcountry-name\b[^"]*"[^>]*>(.*?)</span>"#
);
pattern!(
    division_block_re,
    r#"(?i)class\s*=\s*"[^"]*\bstats-level-block\b[^"]*""#
);
pattern!(division_re, r"(?is)<li\b[^>]*>.*?<a\b[^>]*>(.*?)</a>");
pattern!(stats_block_re, r#"(?i)\bid\s*=\s*["']benchmarkStats["']"#);
pattern!(tag_name_re, r"^<([A-Za-z][A-Za-z0-9]*)");
pattern!(
    open_table_re,
    r"(?is)<h4\b[^>]*>\s*Open\s*</h4>.*?<table\b[^>]*>(.*?)</table>"
);
pattern!(row_re, r"(?is)<tr\b[^>]*>(.*?)</tr>");
pattern!(cell_re, r"(?is)<td\b[^>]*>(.*?)</td>");
pattern!(
    rank_re,
    r#"(?is)<span\b[^>]*class\s*=\s*"[^"]*\brank\b[^"]*"[^>]*>(.*?)</span>"#
);
pattern!(
    stats_header_re,
    r#"(?is)<th\b[^>]*class\s*=\s*"[^"]*\bstats-header\b[^"]*"[^>]*>(.*?)</th>"#
);
pattern!(row_end_re, r"(?i)</tr>");

/// Visible text of an HTML fragment: tags removed, common entities decoded,
/// whitespace collapsed.
pub fn text_of(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    space_re().replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        let base = base_url.trim_end_matches('/');
        let path = href.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

/// Unique absolute URLs of "View Profile" links, in page order.
pub fn extract_profile_links(html: &str, base_url: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    anchor_re()
        .captures_iter(html)
        .filter(|cap| text_of(&cap[2]) == "View Profile")
        .filter_map(|cap| {
            let attrs = cap.get(1)?.as_str();
            let href = href_re().captures(attrs)?;
            let raw = href.get(1).or_else(|| href.get(2))?.as_str().trim();
            (!raw.is_empty()).then(|| absolute_url(base_url, &decode_entities(raw)))
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Whether the page carries the athlete profile root element.
pub fn is_profile_page(html: &str) -> bool {
    html.contains(r#"id="athleteProfile""#) || html.contains("id='athleteProfile'")
}

/// Pull every known field out of a profile page.
pub fn extract_profile(html: &str, profile_url: &str, open_year: i32) -> AthleteRecord {
    AthleteRecord {
        profile_url: profile_url.to_string(),
        name: athlete_name(html).unwrap_or_else(|| NOT_AVAILABLE.into()),
        country: first_text(country_re(), html).unwrap_or_else(|| NOT_AVAILABLE.into()),
        gender: element_marked(division_block_re(), html)
            .and_then(|block| first_text(division_re(), block))
            .unwrap_or_else(|| NOT_AVAILABLE.into()),
        open_rank: open_rank(html, open_year).unwrap_or_default(),
        benchmarks: benchmark_values(html),
    }
}

/// The element whose opening tag contains byte offset `at`, up to and
/// including its matching close tag. Runs to the end of input if unclosed.
fn enclosing_element(html: &str, at: usize) -> Option<&str> {
    let start = html[..at].rfind('<')?;
    let scope = &html[start..];
    let name = tag_name_re().captures(scope)?.get(1)?.as_str();
    let tags = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(name))).ok()?;

    let mut depth = 0usize;
    for tag in tags.captures_iter(scope) {
        let whole = tag.get(0)?;
        if tag[1].is_empty() {
            if !whole.as_str().ends_with("/>") {
                depth += 1;
            }
        } else {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(&scope[..whole.end()]);
            }
        }
    }
    Some(scope)
}

/// First element whose opening tag matches `marker`.
fn element_marked<'a>(marker: &Regex, html: &'a str) -> Option<&'a str> {
    enclosing_element(html, marker.find(html)?.start())
}

fn first_text(re: &Regex, html: &str) -> Option<String> {
    let text = text_of(re.captures(html)?.get(1)?.as_str());
    (!text.is_empty()).then_some(text)
}

/// First and last name live in the first two spans of the heading.
fn athlete_name(html: &str) -> Option<String> {
    let block = element_marked(name_block_re(), html)?;
    let heading = heading_re().captures(block)?.get(1)?.as_str();
    let mut spans = span_re().captures_iter(heading).map(|c| text_of(&c[1]));
    let first = spans.next()?;
    let last = spans.next()?;
    Some(format!("{first} {last}"))
}

fn open_rank(html: &str, year: i32) -> Option<String> {
    let table = open_table_re().captures(html)?.get(1)?.as_str();
    let year = year.to_string();
    let row = row_re().captures_iter(table).find_map(|row| {
        let mut cells = cell_re().captures_iter(row.get(1)?.as_str());
        let first = cells.next()?;
        (text_of(&first[1]) == year).then(|| cells.next().map(|c| c[1].to_string()))
    })??;
    let rank = text_of(rank_re().captures(&row)?.get(1)?.as_str());
    Some(rank.chars().filter(char::is_ascii_digit).collect())
}

/// `(header text, adjacent cell text)` for every stats header inside the
/// `benchmarkStats` container.
fn stats_rows(html: &str) -> Vec<(String, Option<String>)> {
    let scope = element_marked(stats_block_re(), html).unwrap_or_default();

    stats_header_re()
        .captures_iter(scope)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let header = text_of(cap.get(1)?.as_str());
            let rest = &scope[whole.end()..];
            let row_rest = row_end_re().find(rest).map_or(rest, |m| &rest[..m.start()]);
            let value = cell_re().captures(row_rest).map(|c| text_of(&c[1]));
            Some((header, value))
        })
        .collect()
}

fn benchmark_values(html: &str) -> Vec<String> {
    let rows = stats_rows(html);
    BENCHMARKS
        .iter()
        .map(|name| {
            let needle = name.to_lowercase();
            rows.iter()
                .find(|(header, _)| header.to_lowercase().contains(&needle))
                .and_then(|(_, value)| value.as_deref())
                .filter(|v| *v != "--")
                .and_then(|v| v.split_whitespace().next())
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}
