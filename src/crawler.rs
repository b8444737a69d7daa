//! Tender-notice keyword search.
//!
//! The feed pipeline only sees tenders that are announced through a feed.
//! Many procurement notices never are, so a second tool searches the open
//! web for a fixed list of equipment keywords (blowers, submersible mixers,
//! dewatering decanters, aeration diffusers, CHP, biogas, UV) and records
//! whatever a search engine currently returns for them.
//!
//! Searches go through DuckDuckGo's HTML endpoint, which serves plain
//! markup without JavaScript. Each keyword becomes one query, enriched with
//! a site filter and the Persian procurement terms (tender / auction /
//! inquiry), and yields up to a fixed number of hits. A failed query is
//! recorded in the report with its error instead of failing the run; the
//! report is a best-effort lead list, not a feed.
//!
//! The whole run is serialized as one [`CrawlerReport`] JSON document that
//! the site's tools page renders client-side.

use crate::normalize::normalize_title;
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Equipment and technology keywords the tenders page tracks.
pub const KEYWORDS: [&str; 7] = [
    "مناقصه توربو بلوئر",
    "میکسر مستغرق",
    "دکانتر آبگیری سانتریفیوژ",
    "دیفیوزر هوادهی",
    "CHP",
    "بیوگاز",
    "UV",
];

/// Appended to every keyword: restrict to plausible domains and require a
/// procurement term so generic product pages rank below actual notices.
const QUERY_SUFFIX: &str = "(site:.ir OR site:.org OR site:.com) (مناقصه OR مزایده OR استعلام)";

/// DuckDuckGo's JavaScript-free HTML frontend.
const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// The HTML endpoint answers generic client user agents with a challenge
/// page, so the crawler identifies as a browser.
const BROWSER_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

fn sel_result() -> &'static Selector {
    static SEL: OnceCell<Selector> = OnceCell::new();
    SEL.get_or_init(|| Selector::parse(".result").unwrap())
}

fn sel_link() -> &'static Selector {
    static SEL: OnceCell<Selector> = OnceCell::new();
    SEL.get_or_init(|| Selector::parse("a.result__a").unwrap())
}

fn sel_snippet() -> &'static Selector {
    static SEL: OnceCell<Selector> = OnceCell::new();
    SEL.get_or_init(|| Selector::parse(".result__snippet").unwrap())
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// The outcome of one keyword's query: its hits, or the error that kept it
/// from producing any.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResult {
    pub keyword: String,
    pub query: String,
    pub items: Vec<SearchHit>,
    pub error: Option<String>,
}

/// The full run's output, written as `crawler.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CrawlerReport {
    /// When this report was generated.
    pub generated_at: DateTime<Utc>,
    /// Display form of `generated_at`, `YYYY-MM-DD HH:MM UTC`.
    pub updated_at: String,
    /// One entry per tracked keyword, in keyword order.
    pub queries: Vec<QueryResult>,
}

impl CrawlerReport {
    pub fn new(generated_at: DateTime<Utc>, queries: Vec<QueryResult>) -> Self {
        Self {
            updated_at: generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            generated_at,
            queries,
        }
    }

    /// Write the report as pretty-printed JSON, creating parent directories
    /// as needed. A failed write is a run-level failure: a crawler run that
    /// produced no report did nothing.
    #[instrument(level = "info", skip_all, fields(path = %path))]
    pub async fn write(&self, path: &str) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, json).await?;
        info!(queries = self.queries.len(), "Wrote crawler report");
        Ok(())
    }
}

/// Build the HTTP client used for all searches in a run.
pub fn build_client(timeout_secs: u64) -> Result<Client, Box<dyn Error>> {
    let client = Client::builder()
        .user_agent(BROWSER_UA)
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// The full query string for one keyword, whitespace-collapsed.
pub fn build_query(keyword: &str) -> String {
    normalize_title(&format!("{keyword} {QUERY_SUFFIX}"))
}

/// Extract up to `max_hits` results from a search result page.
///
/// A hit needs a non-empty title and an absolute http(s) link; the engine's
/// own redirect links (protocol-relative `//duckduckgo.com/l/...`) are
/// dropped. Hits without a snippet get an empty one.
pub fn parse_hits(html: &str, max_hits: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let mut hits = Vec::new();
    for result in document.select(sel_result()) {
        let Some(anchor) = result.select(sel_link()).next() else {
            continue;
        };
        let Some(link) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        let title = normalize_title(&anchor.text().collect::<Vec<_>>().join(" "));
        if title.is_empty() || !link.starts_with("http") {
            continue;
        }
        let snippet = result
            .select(sel_snippet())
            .next()
            .map(|s| normalize_title(&s.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default();
        hits.push(SearchHit {
            title,
            link: link.to_string(),
            snippet,
        });
        if hits.len() >= max_hits {
            break;
        }
    }
    hits
}

/// Run one keyword's search. Request or HTTP failures end up in the
/// result's `error` field, never as a propagated error.
#[instrument(level = "info", skip(client), fields(%keyword))]
pub async fn search_keyword(client: &Client, keyword: &str, max_hits: usize) -> QueryResult {
    let query = build_query(keyword);
    let (items, error) = match request_results(client, &query).await {
        Ok(body) => (parse_hits(&body, max_hits), None),
        Err(e) => {
            warn!(%keyword, error = %e, "Search request failed");
            (Vec::new(), Some(e.to_string()))
        }
    };
    info!(%keyword, hits = items.len(), "Searched keyword");
    QueryResult {
        keyword: keyword.to_string(),
        query,
        items,
        error,
    }
}

async fn request_results(client: &Client, query: &str) -> Result<String, Box<dyn Error>> {
    let response = client
        .post(SEARCH_URL)
        .form(&[("q", query), ("kl", "ir-fa")])
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(format!("search returned HTTP {}", response.status()).into());
    }
    Ok(response.text().await?)
}

/// Search every keyword in order, pausing between queries so the engine is
/// not hit in a burst. One result per keyword, always, errors included.
#[instrument(level = "info", skip_all, fields(keywords = keywords.len()))]
pub async fn run_searches(
    client: &Client,
    keywords: &[&str],
    max_hits: usize,
    pause: Duration,
) -> Vec<QueryResult> {
    let mut queries = Vec::with_capacity(keywords.len());
    for (index, keyword) in keywords.iter().enumerate() {
        if index > 0 {
            tokio::time::sleep(pause).await;
        }
        queries.push(search_keyword(client, keyword, max_hits).await);
    }
    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RESULTS_SAMPLE: &str = r#"<html><body><div class="results">
  <div class="result results_links web-result">
    <div class="result__body">
      <h2 class="result__title">
        <a rel="nofollow" class="result__a" href="https://tenders.example.ir/notice/91">مناقصه   خرید توربو بلوئر</a>
      </h2>
      <a class="result__snippet" href="https://tenders.example.ir/notice/91">آگهی مناقصه عمومی
        خرید و نصب توربو بلوئر هوادهی</a>
    </div>
  </div>
  <div class="result">
    <h2 class="result__title">
      <a class="result__a" href="//duckduckgo.com/l/?uddg=x">نتیجه ریدایرکت</a>
    </h2>
  </div>
  <div class="result">
    <h2 class="result__title">
      <a class="result__a" href="https://example.org/item/2">نتیجه دوم</a>
    </h2>
  </div>
</div></body></html>"#;

    #[test]
    fn parses_title_link_and_snippet() {
        let hits = parse_hits(RESULTS_SAMPLE, 15);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "مناقصه خرید توربو بلوئر");
        assert_eq!(hits[0].link, "https://tenders.example.ir/notice/91");
        assert_eq!(hits[0].snippet, "آگهی مناقصه عمومی خرید و نصب توربو بلوئر هوادهی");
        // No snippet element on the second result.
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn drops_protocol_relative_redirect_links() {
        let hits = parse_hits(RESULTS_SAMPLE, 15);
        assert!(hits.iter().all(|h| h.link.starts_with("http")));
    }

    #[test]
    fn enforces_the_hit_cap() {
        let hits = parse_hits(RESULTS_SAMPLE, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].link, "https://tenders.example.ir/notice/91");
    }

    #[test]
    fn build_query_collapses_whitespace_and_appends_procurement_terms() {
        let q = build_query("میکسر  مستغرق");
        assert!(!q.contains("  "));
        assert!(q.starts_with("میکسر مستغرق"));
        assert!(q.contains("site:.ir"));
        assert!(q.contains("مزایده"));
    }

    #[tokio::test]
    async fn report_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/crawler.json");

        let ts = Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap();
        let report = CrawlerReport::new(
            ts,
            vec![QueryResult {
                keyword: "بیوگاز".into(),
                query: build_query("بیوگاز"),
                items: vec![],
                error: Some("request failed".into()),
            }],
        );
        report.write(path.to_str().unwrap()).await.unwrap();

        let back: CrawlerReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.updated_at, "2025-05-06 12:00 UTC");
        assert_eq!(back.queries.len(), 1);
        assert_eq!(back.queries[0].error.as_deref(), Some("request failed"));
    }
}
