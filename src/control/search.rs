use std::future::Future;
use std::pin::Pin;

/// Future type for the search seam, boxed so providers stay object-safe.
pub type SearchFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Vec<String>>> + Send + 'a>>;

/// The external keyword-search collaborator (`GET /search?q=...` upstream).
/// Treated as unreliable by contract: transport failures and empty result
/// lists are both recovered locally, never surfaced as hard errors.
pub trait SearchProvider: Send + Sync {
    fn search<'a>(&'a self, keyword: &'a str) -> SearchFuture<'a>;
}

/// Provider for deployments without a search backend. Always fails, which
/// routes every keyword through the local fallback catalog.
pub struct NoSearch;

impl SearchProvider for NoSearch {
    fn search<'a>(&'a self, _keyword: &'a str) -> SearchFuture<'a> {
        Box::pin(async { Err(anyhow::anyhow!("no search backend configured")) })
    }
}

/// Fixed fallback catalog, keyed by category. Matching is by substring of
/// the lowercased keyword, first hit in this order, defaulting to music.
static FALLBACK_CATALOG: [(&str, [&str; 8]); 4] = [
    (
        "music",
        [
            "GACNpJfzyjs", "J7VNYIf39u0", "cd4-UnU8lWY", "rYoZgpAEkFs",
            "qx8hrhBZJ98", "5K4BlOrzlyU", "_dWyKj7I9JM", "5mdvajc9cHU",
        ],
    ),
    (
        "nature",
        [
            "ydYDqZQpim8", "BHACKCNDMW8", "86YLFOog4GM", "lM02vNMRRB0",
            "SMKPKGW083c", "6whWgvGsxdA", "77ZF50ve6rs", "XBPjVzSoepo",
        ],
    ),
    (
        "abstract",
        [
            "O5RdMltKMdA", "kjFCWSxpNd0", "XqZsoesa55w", "n_Dv4JMiwwc",
            "eBGIQ7ZuuiU", "dQw4w9WgXcQ", "jfKfPfyJRdk", "5qap5aO4i9A",
        ],
    ),
    (
        "space",
        [
            "86YLFOog4GM", "BHACKCNDMW8", "ydYDqZQpim8", "lM02vNMRRB0",
            "SMKPKGW083c", "6whWgvGsxdA", "77ZF50ve6rs", "XBPjVzSoepo",
        ],
    ),
];

/// Resolve the catalog category a keyword maps to.
pub fn fallback_category(keyword: &str) -> &'static str {
    let keyword = keyword.to_lowercase();
    FALLBACK_CATALOG
        .iter()
        .find(|(category, _)| keyword.contains(category))
        .map(|(category, _)| *category)
        .unwrap_or("music")
}

/// The fixed video list behind a keyword's category.
pub fn fallback_videos(keyword: &str) -> &'static [&'static str; 8] {
    let category = fallback_category(keyword);
    &FALLBACK_CATALOG
        .iter()
        .find(|(name, _)| *name == category)
        .expect("category resolved from the same table")
        .1
}

/// Uniform random pick within the keyword's category list.
pub fn pick_fallback(keyword: &str) -> &'static str {
    let videos = fallback_videos(keyword);
    videos[fastrand::usize(..videos.len())]
}
