pub mod feed;
pub mod query;
pub mod types;

pub use query::{QueryError, SearchQuery};
pub use types::{FetchOutcome, Paper};

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::rate_limit::{ARXIV_PAGE_INTERVAL, RateLimiter};
use feed::{Feed, FeedError, parse_feed};

const API_URL: &str = "http://export.arxiv.org/api/query";
/// Largest page the client asks for in a single request.
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("arXiv request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("arXiv request failed: status {0}")]
    Status(u16),

    #[error("invalid arXiv URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Feed(#[from] FeedError),
}

/// Source of bibliographic records for a bounded query.
/// Implemented by `ArxivClient` for production; mock implementations used in tests.
pub trait PaperSource {
    async fn fetch(&self, query: &SearchQuery) -> Result<FetchOutcome, FetchError>;
}

/// Paginated client for the arXiv Atom search API.
#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    base_url: String,
    page_size: usize,
    page_interval: Duration,
}

impl ArxivClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            page_interval: ARXIV_PAGE_INTERVAL,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str, page_interval: Duration) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            page_interval,
        }
    }

    async fn fetch_page(
        &self,
        search_query: &str,
        start: usize,
        max_results: usize,
    ) -> Result<Feed, FetchError> {
        let start_param = start.to_string();
        let max_param = max_results.to_string();
        let url = url::Url::parse_with_params(
            &self.base_url,
            &[
                ("search_query", search_query),
                ("start", start_param.as_str()),
                ("max_results", max_param.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ],
        )?;

        let response = self
            .http
            .get(url)
            .header("User-Agent", crate::USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, start, "arXiv API error");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(parse_feed(&body)?)
    }
}

impl PaperSource for ArxivClient {
    /// Walks the result pages newest first until `max_results` distinct
    /// records are collected or the server runs out. Any failing page aborts
    /// the whole fetch and drops the pages already collected.
    async fn fetch(&self, query: &SearchQuery) -> Result<FetchOutcome, FetchError> {
        let search_query = query.search_expression();
        let max_results = query.max_results();
        let mut limiter = RateLimiter::new(self.page_interval);

        let mut papers: Vec<Paper> = Vec::new();
        let mut seen = HashSet::new();
        let mut total_discovered = None;
        let mut offset = 0;

        while papers.len() < max_results {
            let page_size = self.page_size.min(max_results - papers.len());
            limiter.wait().await;

            let page = self.fetch_page(&search_query, offset, page_size).await?;
            if offset == 0 {
                total_discovered = page.total_results;
                info!(total = ?total_discovered, terms = query.terms(), "arXiv search");
            }

            let received = page.papers.len();
            for paper in page.papers {
                if paper.entry_id.is_empty() || seen.insert(paper.entry_id.clone()) {
                    papers.push(paper);
                } else {
                    debug!(entry_id = %paper.entry_id, "skipping duplicate entry");
                }
            }
            offset += received;
            debug!(offset, received, collected = papers.len(), "page fetched");

            let exhausted = total_discovered.is_some_and(|total| offset as u64 >= total);
            if exhausted || received == 0 {
                break;
            }
        }

        papers.truncate(max_results);
        Ok(FetchOutcome {
            papers,
            total_discovered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Instant;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query(max_results: usize) -> SearchQuery {
        SearchQuery::new(
            "quantum error correction",
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
            max_results,
        )
        .unwrap()
    }

    /// Feed page whose entries are numbered `first..first + count`, newest first.
    fn page(total: u64, first: usize, count: usize) -> String {
        let mut xml = format!(
            r#"<feed xmlns="http://www.w3.org/2005/Atom"><opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">{total}</opensearch:totalResults>"#
        );
        for n in first..first + count {
            xml.push_str(&format!(
                "<entry><id>http://arxiv.org/abs/2301.{n:05}</id><published>2023-01-{day:02}T00:00:00Z</published><title>Paper {n}</title><summary>Abstract {n}</summary></entry>",
                day = 31 - (n % 30),
            ));
        }
        xml.push_str("</feed>");
        xml
    }

    fn client(server: &MockServer, page_size: usize, interval: Duration) -> ArxivClient {
        ArxivClient::with_base_url(Client::new(), &format!("{}/api/query", server.uri()), interval)
            .with_page_size(page_size)
    }

    async fn mount_page(server: &MockServer, start: usize, max: usize, body: String) {
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("start", start.to_string()))
            .and(query_param("max_results", max.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn single_page_returns_all_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param(
                "search_query",
                "all:quantum error correction AND submittedDate:[202301010000 TO 202301312359]",
            ))
            .and(query_param("start", "0"))
            .and(query_param("max_results", "5"))
            .and(query_param("sortBy", "submittedDate"))
            .and(query_param("sortOrder", "descending"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page(5, 0, 5)))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server, 100, Duration::ZERO)
            .fetch(&query(5))
            .await
            .unwrap();

        assert_eq!(outcome.total_discovered, Some(5));
        assert_eq!(outcome.papers.len(), 5);
        assert_eq!(outcome.papers[0].title, "Paper 0");
        assert_eq!(outcome.papers[4].title, "Paper 4");
    }

    #[tokio::test]
    async fn paginates_until_max_results() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page(100, 0, 2)).await;
        mount_page(&server, 2, 2, page(100, 2, 2)).await;
        mount_page(&server, 4, 1, page(100, 4, 1)).await;

        let outcome = client(&server, 2, Duration::ZERO)
            .fetch(&query(5))
            .await
            .unwrap();

        assert_eq!(outcome.total_discovered, Some(100));
        let titles: Vec<_> = outcome.papers.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Paper 0", "Paper 1", "Paper 2", "Paper 3", "Paper 4"]);
    }

    #[tokio::test]
    async fn stops_at_discovered_total() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page(3, 0, 2)).await;
        mount_page(&server, 2, 2, page(3, 2, 1)).await;

        let outcome = client(&server, 2, Duration::ZERO)
            .fetch(&query(10))
            .await
            .unwrap();

        assert_eq!(outcome.total_discovered, Some(3));
        assert_eq!(outcome.papers.len(), 3);
    }

    #[tokio::test]
    async fn empty_page_ends_pagination() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page(50, 0, 2)).await;
        mount_page(&server, 2, 2, page(50, 0, 0)).await;

        let outcome = client(&server, 2, Duration::ZERO)
            .fetch(&query(10))
            .await
            .unwrap();

        assert_eq!(outcome.papers.len(), 2);
        assert_eq!(outcome.total_discovered, Some(50));
    }

    #[tokio::test]
    async fn duplicate_entries_across_pages_are_dropped() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page(10, 0, 2)).await;
        mount_page(&server, 2, 2, page(10, 1, 2)).await;
        mount_page(&server, 4, 1, page(10, 3, 1)).await;

        let outcome = client(&server, 2, Duration::ZERO)
            .fetch(&query(4))
            .await
            .unwrap();

        let ids: HashSet<_> = outcome.papers.iter().map(|p| p.entry_id.clone()).collect();
        assert_eq!(ids.len(), outcome.papers.len());
        let titles: Vec<_> = outcome.papers.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Paper 0", "Paper 1", "Paper 2", "Paper 3"]);
    }

    #[tokio::test]
    async fn failing_page_discards_collected_records() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page(10, 0, 2)).await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("start", "2"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client(&server, 2, Duration::ZERO).fetch(&query(4)).await;
        assert!(matches!(result, Err(FetchError::Status(503))));
    }

    #[tokio::test]
    async fn non_feed_page_discards_collected_records() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page(10, 0, 2)).await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("start", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Rate exceeded."))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server, 2, Duration::ZERO).fetch(&query(4)).await;
        assert!(
            matches!(result, Err(FetchError::Feed(FeedError::NotAFeed))),
            "got: {result:?}"
        );
    }

    #[tokio::test]
    async fn truncated_page_discards_collected_records() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page(10, 0, 2)).await;
        let mut cut = page(10, 2, 2);
        cut.truncate(cut.len() - "</summary></entry></feed>".len());
        mount_page(&server, 2, 2, cut).await;

        let result = client(&server, 2, Duration::ZERO).fetch(&query(4)).await;
        assert!(matches!(result, Err(FetchError::Feed(FeedError::Truncated(_)))));
    }

    #[test]
    fn default_client_paces_pages_at_arxiv_interval() {
        let client = ArxivClient::new(Client::new());
        assert_eq!(client.page_interval, ARXIV_PAGE_INTERVAL);
        assert_eq!(client.page_interval, Duration::from_millis(350));
        assert_eq!(client.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(client.base_url, API_URL);
    }

    #[tokio::test]
    async fn malformed_feed_is_a_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<feed><entry><id>x</title></feed>"),
            )
            .mount(&server)
            .await;

        let result = client(&server, 100, Duration::ZERO).fetch(&query(3)).await;
        let err = result.unwrap_err();
        assert!(matches!(err, FetchError::Feed(_)));
        assert!(err.to_string().contains("malformed"));
    }

    #[tokio::test]
    async fn pages_are_paced_by_interval() {
        let server = MockServer::start().await;
        mount_page(&server, 0, 2, page(100, 0, 2)).await;
        mount_page(&server, 2, 2, page(100, 2, 2)).await;
        mount_page(&server, 4, 2, page(100, 4, 2)).await;

        let interval = Duration::from_millis(120);
        let started = Instant::now();
        let outcome = client(&server, 2, interval)
            .fetch(&query(6))
            .await
            .unwrap();

        assert_eq!(outcome.papers.len(), 6);
        assert!(started.elapsed() >= interval * 2, "elapsed {:?}", started.elapsed());
    }
}
