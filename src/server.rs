//! Server-rendered front end for the search and service-desk pages.
//!
//! Every page request builds a fresh controller over the shared
//! [`HelpdeskApi`], drives it with the request's parameters, and renders the
//! resulting state. Form submissions redirect back to a page (post/redirect/get),
//! with the outcome carried over as a notification.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/search?q=..&filtered=1&opensearch=on..` | Search page, optionally with results |
//! | `POST` | `/search/select` | Ticket form for a chosen result |
//! | `POST` | `/search/ticket` | Create a ticket and attach the chosen solution |
//! | `GET`  | `/servicedesk[?ticket=ID][&new=1]` | Ticket list, details or new-ticket form |
//! | `POST` | `/servicedesk/tickets` | Create a ticket |
//! | `POST` | `/servicedesk/tickets/{id}/comment` | Comment on a ticket |
//! | `POST` | `/notifications/{id}/dismiss` | Close a notification early |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::api::{HelpdeskApi, HttpApi};
use crate::config::Config;
use crate::filter::SourceFilter;
use crate::models::{Priority, Source};
use crate::notify::{NotificationCenter, NotificationKind};
use crate::render::{self, TicketDraft};
use crate::search::SearchController;
use crate::servicedesk::TicketController;
use crate::util::get_url_parameter;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    api: Arc<dyn HelpdeskApi>,
    /// One notification area for the whole front end.
    notifications: Arc<Mutex<NotificationCenter>>,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn HelpdeskApi>) -> Self {
        let ttl = Duration::from_millis(config.ui.notification_ttl_ms);
        Self {
            config: Arc::new(config),
            api,
            notifications: Arc::new(Mutex::new(NotificationCenter::new(ttl))),
        }
    }

    async fn notify(&self, message: impl Into<String>, kind: NotificationKind) {
        self.notifications.lock().await.show(message, kind);
    }
}

/// Builds the router. Split out from [`run_server`] so tests can serve it on
/// an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { Redirect::to("/search") }))
        .route("/health", get(handle_health))
        .route("/search", get(handle_search_page))
        .route("/search/select", post(handle_select_result))
        .route("/search/ticket", post(handle_search_ticket))
        .route("/servicedesk", get(handle_servicedesk_page))
        .route("/servicedesk/tickets", post(handle_create_ticket))
        .route(
            "/servicedesk/tickets/{id}/comment",
            post(handle_add_comment),
        )
        .route(
            "/notifications/{id}/dismiss",
            post(handle_dismiss_notification),
        )
        .layer(cors)
        .with_state(state)
}

/// Starts the front end on `[server].bind`, talking to `[backend].base_url`.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let api = Arc::new(HttpApi::from_config(config)?);
    let state = AppState::new(config.clone(), api);

    println!(
        "Helpdesk front end listening on http://{} (backend {})",
        bind_addr, config.backend.base_url
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ============ Layout ============

#[derive(Clone, Copy, PartialEq, Eq)]
enum Nav {
    Search,
    ServiceDesk,
}

async fn page(state: &AppState, nav: Nav, title: &str, body: &str) -> Html<String> {
    let notifications = {
        let mut center = state.notifications.lock().await;
        center.sweep(Instant::now());
        render::render_notifications(&center)
    };

    let link = |target: Nav, href: &str, label: &str| {
        let active = if target == nav { " active" } else { "" };
        format!(
            r#"<li class="nav-item"><a class="nav-link{}" href="{}">{}</a></li>"#,
            active, href, label
        )
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
</head>
<body>
<nav class="navbar navbar-expand navbar-light bg-light mb-3"><div class="container"><ul class="navbar-nav">{search}{desk}</ul></div></nav>
{notifications}
<main class="container">
{body}
</main>
</body>
</html>
"#,
        title = title,
        search = link(Nav::Search, "/search", "Поиск решений"),
        desk = link(Nav::ServiceDesk, "/servicedesk", "Мои заявки"),
        notifications = notifications,
        body = body,
    ))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Search page ============

/// Reads the filter panel from the query string: the three per-source boxes,
/// plus the new state of the "all" box if the user toggled it.
///
/// Without `filtered=1` the request did not come from the panel and every
/// source is checked. The "all" box counts as toggled when its submitted
/// state differs from `prev_all`, the state it was rendered with.
fn filter_from_query(location: &str) -> (SourceFilter, Option<bool>) {
    if get_url_parameter(location, "filtered") != "1" {
        return (SourceFilter::all_checked(), None);
    }
    let mut filter = SourceFilter::none_checked();
    for source in Source::KNOWN.iter() {
        if get_url_parameter(location, source.as_str()) == "on" {
            filter.set(source, true);
        }
    }

    let all = get_url_parameter(location, "all") == "on";
    let prev_all = get_url_parameter(location, "prev_all") == "1";
    let toggled = (all != prev_all).then_some(all);
    (filter, toggled)
}

async fn handle_search_page(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let location = raw.unwrap_or_default();
    let query = get_url_parameter(&location, "q");
    let (filter, all_toggled) = filter_from_query(&location);

    let mut controller = SearchController::new(state.api.clone(), &state.config).with_filter(filter);
    if let Some(all) = all_toggled {
        controller.set_all_sources(all);
    }
    if !query.trim().is_empty() {
        // failures are rendered into the results area
        let _ = controller.search_solutions(&query).await;
    }

    let body = format!(
        r#"{}<div id="search-results">{}</div>"#,
        render::render_search_form(&query, controller.filter()),
        controller.render()
    );
    page(&state, Nav::Search, "Поиск решений", &body)
        .await
        .into_response()
}

#[derive(Deserialize)]
struct SelectForm {
    #[serde(default)]
    solution: String,
    #[serde(default)]
    source: Source,
}

async fn handle_select_result(
    State(state): State<AppState>,
    Form(form): Form<SelectForm>,
) -> Response {
    let mut controller = SearchController::new(state.api.clone(), &state.config);
    let draft = controller.select_solution(form.solution.clone(), form.source.clone());

    let body = format!(
        r#"{}<div id="ticket-form-container"><h4>Новая заявка</h4>{}{}</div>"#,
        render::render_search_form("", controller.filter()),
        render::render_selected_solution(&form.solution, &form.source),
        render::render_ticket_form(
            &draft,
            "/search/ticket",
            &[
                ("solution", form.solution.as_str()),
                ("source", form.source.as_str()),
            ],
        )
    );
    page(&state, Nav::Search, "Новая заявка", &body)
        .await
        .into_response()
}

#[derive(Deserialize)]
struct SearchTicketForm {
    #[serde(default)]
    solution: String,
    #[serde(default)]
    source: Source,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    priority: Priority,
}

async fn handle_search_ticket(
    State(state): State<AppState>,
    Form(form): Form<SearchTicketForm>,
) -> Response {
    let mut controller = SearchController::new(state.api.clone(), &state.config);
    controller.select_solution(form.solution, form.source);
    let draft = TicketDraft {
        subject: form.subject,
        description: form.description,
        priority: form.priority,
    };

    match controller.submit_ticket(&draft).await {
        Ok(id) => {
            state
                .notify(render::ticket_created_message(id), NotificationKind::Success)
                .await
        }
        Err(e) => {
            tracing::warn!(error = %e, "ticket from search result failed");
            state
                .notify(render::user_message(&e), NotificationKind::Danger)
                .await
        }
    }
    Redirect::to("/search").into_response()
}

// ============ Service desk page ============

async fn handle_servicedesk_page(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Response {
    let location = raw.unwrap_or_default();
    let mut controller = TicketController::new(state.api.clone(), &state.config);

    // a failed load is rendered as the list's error state
    let _ = controller.load_tickets().await;

    let ticket_param = get_url_parameter(&location, "ticket");
    if !ticket_param.is_empty() {
        match ticket_param.parse::<u64>() {
            Ok(id) => {
                if let Err(e) = controller.show_ticket_details(id) {
                    state
                        .notify(render::user_message(&e), NotificationKind::Warning)
                        .await;
                }
            }
            Err(_) => return (StatusCode::BAD_REQUEST, "invalid ticket id").into_response(),
        }
    } else if get_url_parameter(&location, "new") == "1" {
        controller.open_new_ticket_form();
    }

    let body = format!(
        r#"<div class="d-flex justify-content-between mb-3"><h3>Мои заявки</h3><a id="new-ticket-btn" class="btn btn-primary" href="/servicedesk?new=1">Новая заявка</a></div>{}"#,
        controller.render()
    );
    page(&state, Nav::ServiceDesk, "Мои заявки", &body)
        .await
        .into_response()
}

#[derive(Deserialize)]
struct NewTicketForm {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    priority: Priority,
}

async fn handle_create_ticket(
    State(state): State<AppState>,
    Form(form): Form<NewTicketForm>,
) -> Response {
    let mut controller = TicketController::new(state.api.clone(), &state.config);
    let draft = TicketDraft {
        subject: form.subject,
        description: form.description,
        priority: form.priority,
    };

    match controller.create_ticket(&draft).await {
        Ok(id) => {
            state
                .notify(render::ticket_created_message(id), NotificationKind::Success)
                .await
        }
        Err(e) => {
            tracing::warn!(error = %e, "creating ticket failed");
            state
                .notify(render::user_message(&e), NotificationKind::Danger)
                .await
        }
    }
    Redirect::to("/servicedesk").into_response()
}

#[derive(Deserialize)]
struct CommentForm {
    #[serde(default)]
    comment: String,
}

async fn handle_add_comment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<CommentForm>,
) -> Response {
    let mut controller = TicketController::new(state.api.clone(), &state.config);

    let outcome = async {
        controller.load_tickets().await?;
        controller.show_ticket_details(id)?;
        controller.add_comment(&form.comment).await
    }
    .await;

    match outcome {
        Ok(()) => {
            state
                .notify("Комментарий добавлен", NotificationKind::Success)
                .await
        }
        Err(e) => {
            tracing::warn!(ticket_id = id, error = %e, "adding comment failed");
            state
                .notify(render::user_message(&e), NotificationKind::Danger)
                .await
        }
    }
    Redirect::to(&format!("/servicedesk?ticket={}", id)).into_response()
}

// ============ Notifications ============

async fn handle_dismiss_notification(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> StatusCode {
    if state.notifications.lock().await.dismiss(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
