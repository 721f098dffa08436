use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use vitibrasil::types::{DEFAULT_END_YEAR, DEFAULT_START_YEAR, catalog};
use vitibrasil::utils::ScrapeStats;
use vitibrasil::{ScrapeRequest, WebScraper, YearRange};

#[derive(Parser)]
#[command(name = "vitibrasil")]
#[command(about = "A vitibrasil.cnpuv.embrapa.br report scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a report category over a range of years
    Scrape {
        #[arg(help = "Report category: producao, processamento, comercializacao, importacao or exportacao")]
        category: String,

        #[arg(
            short = 's',
            long,
            help = "Subcategory, required for processamento, importacao and exportacao"
        )]
        subcategory: Option<String>,

        #[arg(long, default_value_t = DEFAULT_START_YEAR, help = "First year to scrape")]
        start_year: i32,

        #[arg(long, default_value_t = DEFAULT_END_YEAR, help = "Last year to scrape (inclusive)")]
        end_year: i32,

        #[arg(
            short = 'c',
            long,
            default_value_t = 1,
            help = "Number of year pages fetched at once",
            value_parser = clap::value_parser!(u16).range(1..)
        )]
        concurrency: u16,

        #[arg(long, help = "Override the site root, e.g. a local mirror")]
        base_url: Option<String>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// List the report categories and their subcategories
    Categories {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn print_categories(format: OutputFormat) {
    let catalog = catalog();

    match format {
        OutputFormat::Json => serialize_json(&catalog),
        OutputFormat::Text => {
            for cat in &catalog {
                println!("{} ({})", cat.key, cat.label);
                for sub in &cat.subcategories {
                    println!("  - {} ({})", sub.key, sub.label);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Categories { format } => print_categories(format),

        Commands::Scrape {
            category,
            subcategory,
            start_year,
            end_year,
            concurrency,
            base_url,
            format,
        } => {
            let request = ScrapeRequest::new(
                &category,
                subcategory.as_deref(),
                YearRange::new(start_year, end_year),
            )
            .unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });

            let mut scraper = WebScraper::new()
                .unwrap_or_else(|e| {
                    log::error!("Error creating scraper: {}", e);
                    process::exit(1);
                })
                .with_max_concurrent_fetches(concurrency.into());
            if let Some(base_url) = base_url {
                scraper = scraper.with_base_url(base_url);
            }

            let outcome = scraper.scrape(&request).await.unwrap_or_else(|e| {
                log::error!("Error scraping {}: {}", request, e);
                process::exit(1);
            });

            if !outcome.failed_years.is_empty() {
                log::warn!("Could not fetch years: {:?}", outcome.failed_years);
            }

            match format {
                OutputFormat::Json => serialize_json(&outcome.records),
                OutputFormat::Text => {
                    if outcome.records.is_empty() {
                        println!("No entries to display.");
                    } else {
                        for (i, record) in outcome.records.iter().enumerate() {
                            let fields = record
                                .iter()
                                .map(|(k, v)| format!("{k}={v}"))
                                .collect::<Vec<_>>()
                                .join(" · ");
                            println!("{:>5}. {}", i + 1, fields);
                        }
                    }
                    print!("{}", ScrapeStats::from_outcome(&request, &outcome));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scrape_defaults() {
        let cli = Cli::try_parse_from(["vitibrasil", "scrape", "producao"]).unwrap();

        match cli.command {
            Commands::Scrape {
                category,
                subcategory,
                start_year,
                end_year,
                concurrency,
                ..
            } => {
                assert_eq!(category, "producao");
                assert_eq!(subcategory, None);
                assert_eq!(start_year, 1970);
                assert_eq!(end_year, 2023);
                assert_eq!(concurrency, 1);
            }
            Commands::Categories { .. } => panic!("expected scrape command"),
        }
    }

    #[test]
    fn test_scrape_rejects_zero_concurrency() {
        let result =
            Cli::try_parse_from(["vitibrasil", "scrape", "producao", "--concurrency", "0"]);
        assert!(result.is_err());
    }
}
