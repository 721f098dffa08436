mod api;
pub mod auth;
pub mod config;

pub use api::{
    ApiError, AppState, DataParams, FAILED_YEARS_HEADER, categories, get_data, home, router,
};
