//! # HTTP API
//!
//! The axum server: HTML pages on top of the page registry, a JSON API
//! for automation, and the per-page reset endpoint the default
//! fallback's "Try again" button posts to.
//!
//! Locking discipline: pages before ledger, ledger before cache. Page
//! rendering holds the pages lock while its loaders take the ledger
//! lock, so handlers never take them in the other order.

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use centry_core::cache::{cached_report, report_cache, CacheStats, ReportCache};
use centry_core::health::{assess, HealthSnapshot};
use centry_core::ledger::TransactionDraft;
use centry_core::reports::UnknownReportKind;
use centry_core::{
    AccountId, AccountKind, CategoryId, Ledger, LedgerError, LedgerStore, Money, MoneyError,
    MonthKey, Report, ReportKind, TxId, TxKind,
};

use crate::pages::{current_month, lock_unpoisoned, Page, PageRegistry, SharedLedger};

// =============================================================================
// STATE
// =============================================================================

const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 120;

/// Server knobs decided at startup.
pub struct AppConfig {
    /// Require `Authorization` on `/api` routes when set.
    pub auth_token: Option<String>,
    /// Budget for mutating API calls, per minute across all clients.
    pub rate_limit_per_minute: u32,
    /// Write-through persistence for API mutations.
    pub store: Option<Box<dyn LedgerStore + Send + Sync>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth_token: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            store: None,
        }
    }
}

/// Shared server state: the ledger, the mounted pages, the report
/// cache, and the optional write-through store.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    ledger: SharedLedger,
    pages: Mutex<PageRegistry>,
    cache: Mutex<ReportCache>,
    limiter: DefaultDirectRateLimiter,
    auth_token: Option<String>,
    store: Option<Box<dyn LedgerStore + Send + Sync>>,
}

impl AppState {
    #[must_use]
    pub fn new(ledger: Ledger, config: AppConfig) -> Self {
        let ledger: SharedLedger = Arc::new(Mutex::new(ledger));
        let pages = PageRegistry::mount_default(&ledger);
        let per_minute =
            NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: Arc::new(AppInner {
                ledger,
                pages: Mutex::new(pages),
                cache: Mutex::new(report_cache()),
                limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
                auth_token: config.auth_token,
                store: config.store,
            }),
        }
    }

    /// Handle to the shared ledger, for wiring and tests.
    #[must_use]
    pub fn ledger_handle(&self) -> SharedLedger {
        Arc::clone(&self.inner.ledger)
    }

    /// Add or replace a mounted page.
    pub fn insert_page(&self, page: Page) {
        lock_unpoisoned(&self.inner.pages).insert(page);
    }

    fn check_rate(&self) -> Result<(), ApiError> {
        self.inner
            .limiter
            .check()
            .map_err(|_| ApiError::RateLimited)
    }

    fn persist(&self, ledger: &Ledger) -> Result<(), ApiError> {
        if let Some(store) = &self.inner.store {
            store.save(ledger).map_err(|err| {
                tracing::error!("failed to persist ledger: {err}");
                ApiError::Internal("failed to persist ledger".to_owned())
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error envelope for every API failure path.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<MoneyError> for ApiError {
    fn from(err: MoneyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<UnknownReportKind> for ApiError {
    fn from(err: UnknownReportKind) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Gate for `/api` routes. Without a configured token everything is
/// open; with one, `Bearer <token>` or `Basic` with the token as the
/// password both pass.
async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if authorized(&state, request.headers()) {
        next.run(request).await
    } else {
        ApiError::Unauthorized.into_response()
    }
}

fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(expected) = state.inner.auth_token.as_deref() else {
        return true;
    };
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    if let Some(token) = value.strip_prefix("Bearer ") {
        return token_matches(token, expected);
    }
    if let Some(encoded) = value.strip_prefix("Basic ") {
        let Ok(decoded) = BASE64_STANDARD.decode(encoded) else {
            return false;
        };
        let Ok(text) = String::from_utf8(decoded) else {
            return false;
        };
        return text
            .split_once(':')
            .is_some_and(|(_user, password)| token_matches(password, expected));
    }
    false
}

/// Constant-time token comparison; length is the only observable
/// difference.
fn token_matches(candidate: &str, expected: &str) -> bool {
    candidate.len() == expected.len()
        && bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

// =============================================================================
// PAGE HANDLERS
// =============================================================================

fn render_page(state: &AppState, slug: &str) -> Result<Html<String>, ApiError> {
    let mut pages = lock_unpoisoned(&state.inner.pages);
    let page = pages
        .get_mut(slug)
        .ok_or_else(|| ApiError::NotFound(format!("no page mounted at /{slug}")))?;
    Ok(Html(page.render_html()))
}

async fn page_dashboard(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_page(&state, "dashboard")
}

async fn page_accounts(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_page(&state, "accounts")
}

async fn page_transactions(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_page(&state, "transactions")
}

async fn page_budgets(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_page(&state, "budgets")
}

async fn reset_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Redirect, ApiError> {
    let mut pages = lock_unpoisoned(&state.inner.pages);
    let page = pages
        .get_mut(&slug)
        .ok_or_else(|| ApiError::NotFound(format!("no page mounted at /{slug}")))?;
    page.reset();
    tracing::info!(page = %slug, "boundary reset");
    Ok(Redirect::to(page.path()))
}

// =============================================================================
// API HANDLERS
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct StatusResponse {
    success: bool,
    #[serde(flatten)]
    snapshot: HealthSnapshot,
    report_cache: CacheStats,
}

async fn api_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let faulted = lock_unpoisoned(&state.inner.pages).faulted_slugs();
    let snapshot = {
        let ledger = lock_unpoisoned(&state.inner.ledger);
        assess(&ledger, current_month(), faulted)
    };
    let report_cache = lock_unpoisoned(&state.inner.cache).stats();
    Json(StatusResponse {
        success: true,
        snapshot,
        report_cache,
    })
}

#[derive(Deserialize)]
struct ReportQuery {
    month: Option<String>,
}

#[derive(Serialize)]
struct ReportResponse {
    success: bool,
    kind: &'static str,
    month: String,
    report: Report,
}

async fn api_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let kind: ReportKind = kind.parse()?;
    let month = match query.month {
        Some(raw) => raw.parse::<MonthKey>()?,
        None => current_month(),
    };
    let report = {
        let ledger = lock_unpoisoned(&state.inner.ledger);
        let mut cache = lock_unpoisoned(&state.inner.cache);
        cached_report(&mut cache, &ledger, kind, month)
    };
    Ok(Json(ReportResponse {
        success: true,
        kind: kind.label(),
        month: month.to_string(),
        report,
    }))
}

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub opening: Option<String>,
}

#[derive(Serialize)]
struct AccountCreated {
    success: bool,
    id: AccountId,
}

async fn api_create_account(
    State(state): State<AppState>,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<AccountCreated>, ApiError> {
    state.check_rate()?;
    let kind = match body.kind.as_deref() {
        None => AccountKind::Checking,
        Some(raw) => raw.parse::<AccountKind>()?,
    };
    let opening: Money = body.opening.as_deref().unwrap_or("0.00").parse()?;

    let mut ledger = lock_unpoisoned(&state.inner.ledger);
    let id = ledger.add_account(&body.name, kind, opening)?;
    state.persist(&ledger)?;
    Ok(Json(AccountCreated { success: true, id }))
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Serialize)]
struct CategoryCreated {
    success: bool,
    id: CategoryId,
}

async fn api_create_category(
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<Json<CategoryCreated>, ApiError> {
    state.check_rate()?;
    let mut ledger = lock_unpoisoned(&state.inner.ledger);
    let id = ledger.add_category(&body.name)?;
    state.persist(&ledger)?;
    Ok(Json(CategoryCreated { success: true, id }))
}

#[derive(Deserialize)]
pub struct CreateTransactionRequest {
    pub account: String,
    pub amount: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub memo: String,
}

#[derive(Serialize)]
struct TransactionCreated {
    success: bool,
    id: TxId,
}

async fn api_create_transaction(
    State(state): State<AppState>,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<Json<TransactionCreated>, ApiError> {
    state.check_rate()?;
    let date = match body.date.as_deref() {
        Some(raw) => raw
            .parse::<chrono::NaiveDate>()
            .map_err(|err| ApiError::BadRequest(format!("invalid date: {err}")))?,
        None => chrono::Local::now().date_naive(),
    };
    let amount: Money = body.amount.parse()?;
    let kind = match body.kind.as_deref() {
        None => TxKind::Expense,
        Some(raw) => raw.parse::<TxKind>()?,
    };

    let mut ledger = lock_unpoisoned(&state.inner.ledger);
    let account = ledger
        .account_by_name(&body.account)
        .map(|a| a.id)
        .ok_or_else(|| ApiError::BadRequest(format!("account not found: {}", body.account)))?;
    let category = match body.category.as_deref() {
        None => None,
        Some(name) => Some(
            ledger
                .category_by_name(name)
                .map(|c| c.id)
                .ok_or_else(|| ApiError::BadRequest(format!("category not found: {name}")))?,
        ),
    };
    let id = ledger.record(TransactionDraft {
        account,
        date,
        amount,
        kind,
        category,
        memo: body.memo,
    })?;
    state.persist(&ledger)?;
    Ok(Json(TransactionCreated { success: true, id }))
}

// =============================================================================
// ROUTER + SERVE
// =============================================================================

/// Build the full application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/status", get(api_status))
        .route("/reports/{kind}", get(api_report))
        .route("/accounts", post(api_create_account))
        .route("/categories", post(api_create_category))
        .route("/transactions", post(api_create_transaction))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(page_dashboard))
        .route("/dashboard", get(page_dashboard))
        .route("/accounts", get(page_accounts))
        .route("/transactions", get(page_transactions))
        .route("/budgets", get(page_budgets))
        .route("/pages/{page}/reset", post(reset_page))
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

// =============================================================================
// TESTS
// =============================================================================
