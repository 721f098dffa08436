pub mod assembler;
pub mod parser;
pub mod scraper;
pub mod types;
pub mod utils;

pub use scraper::{FetchError, PageSource, ScraperError, WebScraper};
pub use types::{
    Category, CategoryInfo, Record, ScrapeOutcome, ScrapeRequest, Subcategory, SubcategoryInfo,
    YearRange,
};

pub(crate) const BASE_URL: &str = "http://vitibrasil.cnpuv.embrapa.br/index.php";
