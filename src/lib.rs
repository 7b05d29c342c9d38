//! Storefront Insights
//!
//! Organization-scoped analytics reports for a multi-tenant storefront, plus
//! the saved report, loyalty and website content endpoints around them.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod common;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod reports;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, routing::get, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::{Any, CorsLayer}};

use crate::auth::{AuthConfig, AuthRouterExt, AuthService};
use crate::common::SharedClock;
use crate::config::AppConfig;
use crate::handlers::AppServices;
use crate::health::HealthState;
use crate::repositories::{
    ContentStore, InMemoryContentStore, InMemoryLoyaltyStore, InMemorySavedReportStore,
    LoyaltyStore, ReportRepository, ReportStore, SavedReportStore, TenantDirectory,
};
use crate::services::{ContentService, LoyaltyService, ReportService, SavedReportService};

/// Storage backends the application state is assembled from
#[derive(Clone)]
pub struct Stores {
    pub reports: Arc<dyn ReportStore>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub saved_reports: Arc<dyn SavedReportStore>,
    pub loyalty: Arc<dyn LoyaltyStore>,
    pub content: Arc<dyn ContentStore>,
}

impl Stores {
    /// Report data and tenancy from the database; write-side records in memory.
    pub fn from_database(db: Arc<DatabaseConnection>) -> Self {
        let repository = Arc::new(ReportRepository::new(db));
        Self {
            reports: repository.clone(),
            tenants: repository,
            saved_reports: Arc::new(InMemorySavedReportStore::new()),
            loyalty: Arc::new(InMemoryLoyaltyStore::new()),
            content: Arc::new(InMemoryContentStore::new()),
        }
    }
}

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub health: HealthState,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores, clock: SharedClock) -> Self {
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));
        let reports = ReportService::new(
            stores.reports.clone(),
            clock.clone(),
            config.report_default_period_days,
        );
        let services = AppServices {
            saved_reports: SavedReportService::new(stores.saved_reports, reports.clone()),
            loyalty: LoyaltyService::new(stores.loyalty, clock.clone()),
            content: ContentService::new(stores.content, clock),
            reports,
        };

        Self {
            config: Arc::new(config),
            auth,
            tenants: stores.tenants,
            health: HealthState::new(stores.reports),
            services,
        }
    }
}

/// CORS from the configured origin list; permissive only where the
/// configuration allows it, otherwise same-origin.
pub fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("no CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// Full HTTP surface: health, authenticated `/api` routes and Swagger UI.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let auth = state.auth.clone();
    let health = state.health.clone();

    Router::new()
        .route("/", get(|| async { "storefront-insights up" }))
        .nest("/health", health::health_routes(health))
        .nest(
            "/api",
            handlers::api_routes().with_auth().with_state(state),
        )
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // AuthService is read from extensions by the auth middleware
        .layer(Extension(auth))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}
