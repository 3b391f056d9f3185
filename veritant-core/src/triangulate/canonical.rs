//! Canonical identity and deduplication.
//!
//! Resolves a stable identity string for each evidence item so mirrored
//! copies of the same work collapse to one entry before anything downstream
//! counts sources. Identity priority: DOI (explicit field, then URL) →
//! CRS-style report number → arXiv id → PubMed id → normalized URL with
//! mirror hosts rewritten to their canonical host.
//!
//! Canonical ids are derived per run and never persisted as authoritative
//! identity.

use crate::types::EvidenceItem;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// Known mirror hosts rewritten to their canonical host.
const MIRROR_HOSTS: &[(&str, &str)] = &[
    ("export.arxiv.org", "arxiv.org"),
    ("ar5iv.org", "arxiv.org"),
    ("ar5iv.labs.arxiv.org", "arxiv.org"),
    ("browse.arxiv.org", "arxiv.org"),
    ("en.m.wikipedia.org", "en.wikipedia.org"),
    ("m.wikipedia.org", "wikipedia.org"),
    ("mobile.reuters.com", "reuters.com"),
    ("amp.theguardian.com", "theguardian.com"),
    ("edition.cnn.com", "cnn.com"),
    ("europepmc.org", "pubmed.ncbi.nlm.nih.gov"),
];

/// File extensions stripped from the trailing path segment.
const STRIP_EXTENSIONS: &[&str] = &[".html", ".htm", ".pdf", ".php", ".aspx", ".shtml"];

fn doi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"10\.\d{4,9}/[-._;()/:A-Za-z0-9]+").unwrap())
}

fn crs_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(R|RL|RS|IF)(\d{4,5})\b").unwrap())
}

fn arxiv_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{4}\.\d{4,5})(v\d+)?\b").unwrap())
}

fn pmid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"pubmed\.ncbi\.nlm\.nih\.gov/(\d+)").unwrap())
}

/// Result of deduplicating an evidence set.
#[derive(Debug, Clone)]
pub struct DedupResult {
    /// Indices of survivors, in original input order.
    pub kept: Vec<usize>,
    /// Canonical id per survivor, parallel to `kept`.
    pub ids: Vec<String>,
    /// Number of items removed as duplicates/mirrors.
    pub removed: usize,
}

/// Compute the canonical identity string for one evidence item.
pub fn canonical_id(item: &EvidenceItem) -> String {
    if let Some(doi) = item.doi.as_deref()
        && let Some(m) = doi_re().find(doi)
    {
        return format!("doi:{}", m.as_str().trim_end_matches('.').to_lowercase());
    }
    if let Some(m) = doi_re().find(&item.url) {
        return format!("doi:{}", m.as_str().trim_end_matches('.').to_lowercase());
    }

    let host = item.domain.to_lowercase();
    if (host.contains("crsreports.congress.gov") || host.contains("everycrsreport.com"))
        && let Some(caps) = crs_re().captures(&item.url)
    {
        return format!("crs:{}{}", &caps[1], &caps[2]);
    }

    if host.contains("arxiv.org")
        && let Some(caps) = arxiv_re().captures(&item.url)
    {
        // Version suffixes collapse: v1 and v2 are the same work.
        return format!("arxiv:{}", &caps[1]);
    }

    if let Some(caps) = pmid_re().captures(&item.url) {
        return format!("pmid:{}", &caps[1]);
    }

    format!("url:{}", normalize_url(&item.url))
}

/// Normalize a URL to `host+path`: mirror hosts collapsed, `www.` and
/// archive wrappers stripped, query/fragment dropped, trailing slash and
/// known file extensions removed.
pub fn normalize_url(raw: &str) -> String {
    let unwrapped = unwrap_archive(raw);
    let Ok(parsed) = Url::parse(&unwrapped) else {
        // Not parseable; fall back to a trimmed lowercase form.
        return unwrapped.trim().trim_end_matches('/').to_lowercase();
    };

    let mut host = parsed.host_str().unwrap_or("").to_lowercase();
    if let Some(stripped) = host.strip_prefix("www.") {
        host = stripped.to_string();
    }
    for (mirror, canonical) in MIRROR_HOSTS {
        if host == *mirror {
            host = canonical.to_string();
            break;
        }
    }

    let mut path = parsed.path().trim_end_matches('/').to_lowercase();
    for ext in STRIP_EXTENSIONS {
        if let Some(stripped) = path.strip_suffix(ext) {
            path = stripped.to_string();
            break;
        }
    }

    format!("{}{}", host, path)
}

/// Unwrap a Wayback Machine URL to the archived target.
fn unwrap_archive(raw: &str) -> String {
    if let Some(pos) = raw.find("web.archive.org/web/") {
        let rest = &raw[pos + "web.archive.org/web/".len()..];
        if let Some(slash) = rest.find('/') {
            return rest[slash + 1..].to_string();
        }
    }
    raw.to_string()
}

/// Keep only the first item per canonical id, preserving input order.
///
/// Idempotent: running the result through dedup again removes nothing.
pub fn dedup_by_canonical(items: &[EvidenceItem]) -> DedupResult {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();
    let mut ids = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        let id = canonical_id(item);
        if seen.insert(id.clone()) {
            kept.push(idx);
            ids.push(id);
        } else {
            debug!(url = %item.url, canonical = %id, "dropping duplicate evidence");
        }
    }

    let removed = items.len() - kept.len();
    DedupResult { kept, ids, removed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_item(url: &str, domain: &str) -> EvidenceItem {
        EvidenceItem {
            id: Uuid::new_v4(),
            url: url.to_string(),
            domain: domain.to_string(),
            text: String::new(),
            collected_at: Utc::now(),
            published_at: None,
            doi: None,
            peer_reviewed: false,
            official: false,
            cited_primary: None,
            credibility: 0.5,
        }
    }

    #[test]
    fn test_doi_field_wins() {
        let mut item = make_item("https://example.com/paper", "example.com");
        item.doi = Some("10.1000/xyz123".into());
        assert_eq!(canonical_id(&item), "doi:10.1000/xyz123");
    }

    #[test]
    fn test_doi_from_url() {
        let item = make_item("https://doi.org/10.1038/s41586-021-03819-2", "doi.org");
        assert_eq!(canonical_id(&item), "doi:10.1038/s41586-021-03819-2");
    }

    #[test]
    fn test_crs_report_number() {
        let item = make_item(
            "https://crsreports.congress.gov/product/pdf/R/R46768",
            "crsreports.congress.gov",
        );
        assert_eq!(canonical_id(&item), "crs:R46768");
        let mirror = make_item(
            "https://www.everycrsreport.com/reports/R46768.html",
            "everycrsreport.com",
        );
        assert_eq!(canonical_id(&mirror), "crs:R46768");
    }

    #[test]
    fn test_arxiv_mirror_collapse() {
        let a = make_item("https://arxiv.org/abs/2101.12345", "arxiv.org");
        let b = make_item("https://arxiv.org/abs/2101.12345v2", "arxiv.org");
        let c = make_item("https://export.arxiv.org/abs/2101.12345", "export.arxiv.org");
        assert_eq!(canonical_id(&a), "arxiv:2101.12345");
        assert_eq!(canonical_id(&a), canonical_id(&b));
        assert_eq!(canonical_id(&a), canonical_id(&c));
    }

    #[test]
    fn test_pmid() {
        let item = make_item(
            "https://pubmed.ncbi.nlm.nih.gov/33264544/",
            "pubmed.ncbi.nlm.nih.gov",
        );
        assert_eq!(canonical_id(&item), "pmid:33264544");
    }

    #[test]
    fn test_url_normalization() {
        assert_eq!(
            normalize_url("https://www.example.com/report/2024/"),
            "example.com/report/2024"
        );
        assert_eq!(
            normalize_url("https://example.com/report.pdf?utm_source=x#top"),
            "example.com/report"
        );
    }

    #[test]
    fn test_mirror_host_collapse() {
        assert_eq!(
            normalize_url("https://en.m.wikipedia.org/wiki/Tourism"),
            normalize_url("https://en.wikipedia.org/wiki/Tourism"),
        );
    }

    #[test]
    fn test_archive_unwrap() {
        assert_eq!(
            normalize_url("https://web.archive.org/web/20240101000000/https://example.com/stats"),
            "example.com/stats"
        );
    }

    #[test]
    fn test_dedup_keeps_first_stable() {
        let items = vec![
            make_item("https://example.com/a", "example.com"),
            make_item("https://www.example.com/a/", "example.com"),
            make_item("https://example.com/b", "example.com"),
        ];
        let result = dedup_by_canonical(&items);
        assert_eq!(result.kept, vec![0, 2]);
        assert_eq!(result.removed, 1);
    }

    #[test]
    fn test_dedup_idempotent() {
        let items = vec![
            make_item("https://example.com/a", "example.com"),
            make_item("https://example.com/a", "example.com"),
            make_item("https://other.org/x.html", "other.org"),
        ];
        let once = dedup_by_canonical(&items);
        let survivors: Vec<EvidenceItem> =
            once.kept.iter().map(|&i| items[i].clone()).collect();
        let twice = dedup_by_canonical(&survivors);
        assert_eq!(twice.removed, 0);
        assert_eq!(twice.ids, once.ids);
    }
}
