use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use vitibrasil::scraper::scrape_pages;
use vitibrasil::types::{DEFAULT_END_YEAR, DEFAULT_START_YEAR, ValidationError, catalog};
use vitibrasil::{Category, CategoryInfo, PageSource, ScrapeRequest, ScraperError, YearRange};

use crate::auth::require_basic_auth;
use crate::config::Credentials;

pub const FAILED_YEARS_HEADER: &str = "x-failed-years";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Scraper(#[from] ScraperError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Scraper(_) => StatusCode::BAD_GATEWAY,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Shared by every request. Holds no per-scrape state.
#[derive(Debug)]
pub struct AppState<S> {
    source: Arc<S>,
    max_concurrent_fetches: usize,
}

impl<S> AppState<S> {
    pub fn new(source: S, max_concurrent_fetches: usize) -> Self {
        Self {
            source: Arc::new(source),
            max_concurrent_fetches,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            max_concurrent_fetches: self.max_concurrent_fetches,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataParams {
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub subcategory: Option<String>,
}

pub fn router<S>(state: AppState<S>, credentials: Option<&Credentials>) -> Router
where
    S: PageSource + Send + Sync + 'static,
{
    let mut api = Router::new()
        .route("/api/categories", get(categories))
        .route("/api/{category}", get(get_data::<S>));

    if let Some(credentials) = credentials {
        log::info!("HTTP Basic auth enabled for /api");
        api = api.route_layer(middleware::from_fn_with_state(
            Arc::new(credentials.clone()),
            require_basic_auth,
        ));
    }

    Router::new()
        .route("/", get(home))
        .merge(api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /api/{category}`
///
/// Validates the request before touching the network, then scrapes every
/// year of the range and answers with the JSON array of records.
pub async fn get_data<S>(
    State(state): State<AppState<S>>,
    Path(category): Path<String>,
    Query(params): Query<DataParams>,
) -> Result<Response, ApiError>
where
    S: PageSource + Send + Sync + 'static,
{
    let years = YearRange::new(
        params.start_year.unwrap_or(DEFAULT_START_YEAR),
        params.end_year.unwrap_or(DEFAULT_END_YEAR),
    );

    let request = ScrapeRequest::new(&category, params.subcategory.as_deref(), years)
        .inspect_err(|e| log::warn!("Rejected request: {e}"))?;

    let outcome = scrape_pages(state.source.as_ref(), &request, state.max_concurrent_fetches)
        .await
        .inspect_err(|e| log::error!("Failed to scrape {request}: {e}"))?;

    let mut response = Json(outcome.records).into_response();

    if !outcome.failed_years.is_empty() {
        let years = outcome
            .failed_years
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&years) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(FAILED_YEARS_HEADER), value);
        }
    }

    Ok(response)
}

/// `GET /api/categories`
pub async fn categories() -> Json<Vec<CategoryInfo>> {
    Json(catalog())
}

/// `GET /`
pub async fn home() -> Html<String> {
    let mut links = Vec::new();
    for cat in Category::ALL {
        if cat.has_subcategories() {
            for sub in cat.subcategories() {
                let route = format!("/api/{}?subcategory={}", cat.key(), sub.key());
                links.push(format!(
                    "<li><a href=\"{route}\">{route}</a>: {} ({}).</li>",
                    sub.label(),
                    cat.label()
                ));
            }
        } else {
            let route = format!("/api/{}", cat.key());
            links.push(format!(
                "<li><a href=\"{route}\">{route}</a>: Dados de {}.</li>",
                cat.label()
            ));
        }
    }

    Html(format!(
        "<h1>Bem-vindo à API de Dados Vitivinícolas!</h1>\n\
         <p>Use as rotas abaixo para acessar os dados:</p>\n\
         <ul>\n{}\n</ul>\n\
         <p>Adicione os parâmetros <code>start_year</code> e <code>end_year</code> \
         para filtrar os dados, por exemplo \
         <code>/api/producao?start_year=2010&amp;end_year=2020</code>.</p>\n",
        links.join("\n")
    ))
}
