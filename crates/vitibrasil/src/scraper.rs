use std::future::Future;
use std::time::Duration;

use futures::{StreamExt, stream};
use reqwest::Client;

use crate::assembler::{ExtractionError, RowAssembler};
use crate::parser::parse_report_table;
use crate::types::{Category, ScrapeOutcome, ScrapeRequest, Subcategory};

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

/// Anything that can hand back the HTML report page of a category for a year.
pub trait PageSource: Sync {
    fn fetch_page(
        &self,
        category: Category,
        year: i32,
        subcategory: Option<Subcategory>,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: String,
    max_concurrent_fetches: usize,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: crate::BASE_URL.to_string(),
            max_concurrent_fetches: 1,
        }
    }

    /// Points the scraper at another copy of the site, e.g. a mirror.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Number of year pages fetched at once. Results are still assembled in
    /// year order. Zero is treated as one.
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_concurrent_fetches
    }

    pub fn category_url(&self, category: Category) -> String {
        format!("{}?opcao={}", self.base_url, category.option_code())
    }

    pub fn page_url(&self, category: Category, year: i32, subcategory: Option<Subcategory>) -> String {
        let mut url = format!("{}&ano={}", self.category_url(category), year);
        if let Some(sub) = subcategory {
            url.push_str("&subcategoria=");
            url.push_str(sub.key());
        }
        url
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let http_error = |source: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Blank pages carry no table and are not failures.
        response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))
            .map_err(http_error)
    }

    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome, ScraperError> {
        scrape_pages(self, request, self.max_concurrent_fetches).await
    }
}

impl PageSource for WebScraper {
    async fn fetch_page(
        &self,
        category: Category,
        year: i32,
        subcategory: Option<Subcategory>,
    ) -> Result<String, FetchError> {
        let url = self.page_url(category, year, subcategory);
        self.fetch_html(&url).await
    }
}

/// Fetches and parses one page per year of the request and assembles the
/// rows into records.
///
/// Up to `max_concurrent` pages are in flight at once; tables are consumed in
/// ascending year order regardless. A year whose page cannot be fetched adds
/// no rows and is listed in [`ScrapeOutcome::failed_years`].
pub async fn scrape_pages<S: PageSource>(
    source: &S,
    request: &ScrapeRequest,
    max_concurrent: usize,
) -> Result<ScrapeOutcome, ScraperError> {
    let category = request.category();
    let subcategory = request.subcategory();

    log::info!("Scraping {}...", request);

    let mut pages = stream::iter(request.years().years())
        .map(move |year| async move {
            log::info!(
                "Fetching {} (subcategory: {}) for {}",
                category,
                subcategory.map_or("none", |s| s.key()),
                year
            );
            (year, source.fetch_page(category, year, subcategory).await)
        })
        .buffered(max_concurrent.max(1));

    let mut assembler = RowAssembler::new(*request);
    let mut failed_years = Vec::new();

    while let Some((year, page)) = pages.next().await {
        match page {
            Ok(html) => match parse_report_table(&html) {
                Some(table) => {
                    log::debug!("{}: table with {} rows", year, table.rows.len());
                    assembler.push_table(year, table);
                }
                None => log::debug!("{}: no data table", year),
            },
            Err(e) => {
                log::warn!("Skipping {}: {}", year, e);
                failed_years.push(year);
            }
        }
    }

    let records = assembler.into_records()?;

    log::info!(
        "Scraped {} records for {} ({} failed years)",
        records.len(),
        request,
        failed_years.len()
    );

    Ok(ScrapeOutcome {
        records,
        failed_years,
    })
}
