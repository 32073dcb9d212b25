// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod session;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use brokerage_api::{
    AccountAuditTimelineResponse, AccountInfo, AdminWithoutAccountView, ApiError,
    ApplicationFormView, ApplicationRequest, ApplicationStatusView, BulkApproveRequest,
    BulkApproveResponse, CongratulationsView, ListAccountsRequest, ListAccountsResponse,
    LoginRequest, LoginResponse, Navigation, PasswordIdentity, PasswordPolicy, RegisterResponse,
    RegistrationRequest, ReviewAccountRequest, ReviewAccountResponse, WhoAmIResponse,
};
use brokerage_audit::{Action, Actor, AuditEvent, Cause, StateSnapshot};
use brokerage_persistence::{NewUser, Persistence};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::session::SessionUser;

/// Brokerage Server - HTTP server for brokerage account applications
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long, env = "BROKERAGE_DATABASE", global = true)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(long, env = "BROKERAGE_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, env = "BROKERAGE_PORT", default_value_t = 3000)]
    port: u16,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Create a user who may review applications
    CreateSuperuser {
        /// Login name
        #[arg(long)]
        username: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Password
        #[arg(long, env = "BROKERAGE_SUPERUSER_PASSWORD")]
        password: String,
    },
}

/// Application state shared across handlers.
///
/// The persistence layer sits behind a mutex; every request holds it for the
/// duration of its unit of work.
#[derive(Clone)]
struct AppState {
    /// The persistence layer.
    persistence: Arc<Mutex<Persistence>>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Machine-readable error kind.
    error: String,
    /// Human-readable message.
    message: String,
    /// Messages keyed by form field, when the error concerns a form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field_errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Body sent alongside a `303 See Other`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RedirectResponse {
    /// The path the client should load next.
    redirect: String,
    /// A message for the next page.
    message: Option<String>,
}

/// Health check body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The response body.
    body: ErrorResponse,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let (status, kind): (StatusCode, &str) = match &err {
            ApiError::AuthenticationFailed { .. } => {
                (StatusCode::UNAUTHORIZED, "authentication_failed")
            }
            ApiError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "unauthorized"),
            ApiError::DomainRuleViolation { .. } => (StatusCode::CONFLICT, "domain_rule_violation"),
            ApiError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "invalid_input"),
            ApiError::FormInvalid { .. } => (StatusCode::BAD_REQUEST, "form_invalid"),
            ApiError::PasswordPolicyViolation { .. } => {
                (StatusCode::BAD_REQUEST, "password_policy_violation")
            }
            ApiError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Internal { .. } => {
                error!(error = %err, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };

        let field_errors: BTreeMap<String, Vec<String>> = err.field_errors();
        Self {
            status,
            body: ErrorResponse {
                error: kind.to_string(),
                message: err.to_string(),
                field_errors: (!field_errors.is_empty()).then_some(field_errors),
            },
        }
    }
}

/// A page handler's outcome as an HTTP response.
///
/// `Render` is sent as JSON with 200. `Redirect` becomes `303 See Other`
/// with a `Location` header.
struct PageResponse<T>(Navigation<T>);

impl<T: Serialize> IntoResponse for PageResponse<T> {
    fn into_response(self) -> Response {
        match self.0 {
            Navigation::Render(view) => (StatusCode::OK, Json(view)).into_response(),
            Navigation::Redirect { to, message } => (
                StatusCode::SEE_OTHER,
                [(header::LOCATION, to.path())],
                Json(RedirectResponse {
                    redirect: to.path().to_string(),
                    message,
                }),
            )
                .into_response(),
        }
    }
}

/// Builds the cause for a state-changing request.
fn request_cause(method: &Method, uri: &Uri, now: OffsetDateTime) -> Cause {
    Cause::new(
        format!("http-{}", now.unix_timestamp_nanos()),
        format!("{method} {}", uri.path()),
    )
}

/// Handler for GET `/health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
    })
}

/// Handler for POST `/register/`.
async fn handle_register(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), HttpError> {
    info!(username = %req.username, "Handling registration");

    let mut persistence = app_state.persistence.lock().await;
    let response: RegisterResponse =
        brokerage_api::register(&mut persistence, &req, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST `/login/`.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(username = %req.username, "Handling login");

    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse =
        brokerage_api::login(&mut persistence, &req, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/logout/`.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    session: SessionUser,
) -> Result<StatusCode, HttpError> {
    info!(username = %session.user.username, "Handling logout");

    let mut persistence = app_state.persistence.lock().await;
    brokerage_api::logout(&mut persistence, &session.token)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/whoami/`.
async fn handle_whoami(
    AxumState(app_state): AxumState<AppState>,
    session: SessionUser,
) -> Result<Json<WhoAmIResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: WhoAmIResponse =
        brokerage_api::whoami(&mut persistence, &session.user, &session.user_data)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/` and `/supplement/`.
async fn handle_application_form(
    AxumState(app_state): AxumState<AppState>,
    session: SessionUser,
) -> Result<PageResponse<ApplicationFormView>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let page: Navigation<ApplicationFormView> =
        brokerage_api::application_form(&mut persistence, &session.user)?;
    drop(persistence);

    Ok(PageResponse(page))
}

/// Handler for POST `/` and `/supplement/`.
async fn handle_submit_application(
    AxumState(app_state): AxumState<AppState>,
    method: Method,
    uri: Uri,
    session: SessionUser,
    Json(req): Json<ApplicationRequest>,
) -> Result<PageResponse<()>, HttpError> {
    info!(username = %session.user.username, "Handling application submission");

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let cause: Cause = request_cause(&method, &uri, now);

    let mut persistence = app_state.persistence.lock().await;
    let page: Navigation<()> =
        brokerage_api::submit_application(&mut persistence, &session.user, &req, &cause, now)?;
    drop(persistence);

    Ok(PageResponse(page))
}

/// Handler for GET `/status/`.
async fn handle_application_status(
    AxumState(app_state): AxumState<AppState>,
    session: SessionUser,
) -> Result<PageResponse<ApplicationStatusView>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let page: Navigation<ApplicationStatusView> =
        brokerage_api::application_status(&mut persistence, &session.user)?;
    drop(persistence);

    Ok(PageResponse(page))
}

/// Handler for GET `/congratulations/`.
async fn handle_congratulations(
    AxumState(app_state): AxumState<AppState>,
    session: SessionUser,
) -> Result<PageResponse<CongratulationsView>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let page: Navigation<CongratulationsView> =
        brokerage_api::congratulations(&mut persistence, &session.user)?;
    drop(persistence);

    Ok(PageResponse(page))
}

/// Handler for GET `/admin-without-account/`.
async fn handle_admin_without_account(
    session: SessionUser,
) -> Result<PageResponse<AdminWithoutAccountView>, HttpError> {
    let page: Navigation<AdminWithoutAccountView> =
        brokerage_api::admin_without_account(&session.user)?;

    Ok(PageResponse(page))
}

/// Handler for GET `/admin/accounts`.
async fn handle_list_accounts(
    AxumState(app_state): AxumState<AppState>,
    session: SessionUser,
    Query(req): Query<ListAccountsRequest>,
) -> Result<Json<ListAccountsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListAccountsResponse =
        brokerage_api::list_accounts(&mut persistence, &session.user, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/admin/accounts/{id}`.
async fn handle_get_account(
    AxumState(app_state): AxumState<AppState>,
    session: SessionUser,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: AccountInfo =
        brokerage_api::get_account(&mut persistence, &session.user, account_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/admin/accounts/{id}`.
async fn handle_review_account(
    AxumState(app_state): AxumState<AppState>,
    method: Method,
    uri: Uri,
    session: SessionUser,
    Path(account_id): Path<i64>,
    Json(req): Json<ReviewAccountRequest>,
) -> Result<Json<ReviewAccountResponse>, HttpError> {
    info!(
        account_id,
        reviewer = %session.user.username,
        status = %req.status,
        "Handling account review"
    );

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let cause: Cause = request_cause(&method, &uri, now);

    let mut persistence = app_state.persistence.lock().await;
    let response: ReviewAccountResponse = brokerage_api::review_account(
        &mut persistence,
        &session.user,
        account_id,
        &req,
        &cause,
        now,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/admin/accounts/{id}/audit`.
async fn handle_account_audit(
    AxumState(app_state): AxumState<AppState>,
    session: SessionUser,
    Path(account_id): Path<i64>,
) -> Result<Json<AccountAuditTimelineResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: AccountAuditTimelineResponse =
        brokerage_api::get_account_audit_timeline(&mut persistence, &session.user, account_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/admin/accounts/approve`.
async fn handle_bulk_approve(
    AxumState(app_state): AxumState<AppState>,
    method: Method,
    uri: Uri,
    session: SessionUser,
    Json(req): Json<BulkApproveRequest>,
) -> Result<Json<BulkApproveResponse>, HttpError> {
    info!(
        selected = req.account_ids.len(),
        reviewer = %session.user.username,
        "Handling bulk approve"
    );

    let now: OffsetDateTime = OffsetDateTime::now_utc();
    let cause: Cause = request_cause(&method, &uri, now);

    let mut persistence = app_state.persistence.lock().await;
    let response: BulkApproveResponse =
        brokerage_api::bulk_approve_accounts(&mut persistence, &session.user, &req, &cause, now)?;
    drop(persistence);

    Ok(Json(response))
}

/// Builds the application router.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/register/", post(handle_register))
        .route("/login/", post(handle_login))
        .route("/logout/", post(handle_logout))
        .route("/whoami/", get(handle_whoami))
        .route(
            "/",
            get(handle_application_form).post(handle_submit_application),
        )
        .route(
            "/supplement/",
            get(handle_application_form).post(handle_submit_application),
        )
        .route("/status/", get(handle_application_status))
        .route("/congratulations/", get(handle_congratulations))
        .route("/admin-without-account/", get(handle_admin_without_account))
        .route("/admin/accounts", get(handle_list_accounts))
        .route("/admin/accounts/approve", post(handle_bulk_approve))
        .route(
            "/admin/accounts/{id}",
            get(handle_get_account).post(handle_review_account),
        )
        .route("/admin/accounts/{id}/audit", get(handle_account_audit))
        .with_state(app_state)
}

/// Opens the database named on the command line, or an in-memory one.
fn open_persistence(database: Option<&str>) -> Result<Persistence, Box<dyn std::error::Error>> {
    let persistence: Persistence = if let Some(db_path) = database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };
    Ok(persistence)
}

/// Provisions a staff superuser after checking the password policy.
fn create_superuser(
    persistence: &mut Persistence,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, Box<dyn std::error::Error>> {
    let identity: PasswordIdentity<'_> = PasswordIdentity {
        username,
        email,
        first_name: "",
        last_name: "",
    };
    PasswordPolicy::default()
        .validate(password, password, &identity)
        .map_err(ApiError::from)?;

    let user_id: i64 = persistence.create_user(&NewUser {
        username: username.to_string(),
        email: email.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        password: password.to_string(),
        is_staff: true,
        is_superuser: true,
    })?;

    info!(user_id, username, "Created superuser");

    let event: AuditEvent = AuditEvent::new(
        Actor::system(),
        Cause::new(
            String::from("cli-create-superuser"),
            String::from("Command line provisioning"),
        ),
        Action::new(
            String::from("SuperuserCreated"),
            Some(format!("user_id={user_id}")),
        ),
        StateSnapshot::new(String::from("user=none")),
        StateSnapshot::new(format!("user={username},is_staff=true,is_superuser=true")),
        None,
    );
    if let Err(e) = persistence.persist_audit_event(&event) {
        warn!(error = %e, "Failed to record superuser creation");
    }

    Ok(user_id)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Brokerage Server");

    let mut persistence: Persistence = open_persistence(args.database.as_deref())?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::CreateSuperuser {
            username,
            email,
            password,
        } => {
            create_superuser(&mut persistence, &username, &email, &password)?;
            Ok(())
        }
        Commands::Serve => {
            let pruned: usize = persistence.delete_expired_sessions(OffsetDateTime::now_utc())?;
            info!(pruned, "Removed expired sessions");

            let app_state: AppState = AppState {
                persistence: Arc::new(Mutex::new(persistence)),
            };
            let app: Router = build_router(app_state);

            let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
            info!("Server listening on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;

            Ok(())
        }
    }
}
