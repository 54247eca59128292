//! End-to-end tests of the HTTP client, both controllers, and the web front
//! end against an in-process backend.

mod common;

use helpdesk_client::api::{HelpdeskApi, HttpApi};
use helpdesk_client::config::Config;
use helpdesk_client::error::DeskError;
use helpdesk_client::filter::SourceFilter;
use helpdesk_client::models::{Priority, SearchRequest, Source};
use helpdesk_client::render::TicketDraft;
use helpdesk_client::search::SearchController;
use helpdesk_client::server::{router, AppState};
use helpdesk_client::servicedesk::TicketController;
use std::sync::Arc;

fn config_for(base_url: &str) -> Config {
    let mut config = Config::minimal();
    config.backend.base_url = base_url.to_string();
    config
}

async fn setup() -> (Config, Arc<dyn HelpdeskApi>, common::Shared) {
    let (url, state) = common::spawn_backend().await;
    let config = config_for(&url);
    let api: Arc<dyn HelpdeskApi> = Arc::new(HttpApi::from_config(&config).unwrap());
    (config, api, state)
}

// ============ HttpApi ============

#[tokio::test]
async fn test_http_search_sends_sources_and_debug() {
    let (_config, api, state) = setup().await;

    let response = api
        .search(&SearchRequest {
            query: "printer jam".to_string(),
            sources: vec![Source::MediaWiki],
            debug: true,
        })
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].title, "Printer FAQ");
    assert_eq!(response.results[0].tags, vec!["printer", "hardware"]);

    let sent = state.lock().unwrap().searches[0].clone();
    assert_eq!(sent["query"], "printer jam");
    assert_eq!(sent["sources"], serde_json::json!(["mediawiki"]));
    assert_eq!(sent["debug"], true);
}

#[tokio::test]
async fn test_http_error_envelope_becomes_detail() {
    let (_config, api, _state) = setup().await;
    let err = api.get_ticket(404).await.unwrap_err();
    assert_eq!(err.detail(), Some("Ticket not found"));
    assert!(err.to_string().contains("404"));
}

// ============ Search page ============

#[tokio::test]
async fn test_search_renders_backend_order() {
    let (config, api, _state) = setup().await;
    let mut page = SearchController::new(api, &config);

    assert_eq!(page.search_solutions("printer jam").await.unwrap(), 3);
    let html = page.render();
    assert!(html.contains("Найдено решений: 3"));
    let a = html.find("Релевантность: 9.2").unwrap();
    let b = html.find("Релевантность: 8.1").unwrap();
    let c = html.find("Релевантность: 7.8").unwrap();
    assert!(a < b && b < c);
    assert!(html.contains("Worn pickup <em>rollers</em> cause<br>repeated jams."));
    assert!(html.contains("remove the <em>jammed</em> sheet ... tray 2"));
}

#[tokio::test]
async fn test_search_failure_shows_server_detail() {
    let (config, api, _state) = setup().await;
    let mut page = SearchController::new(api, &config);

    let err = page.search_solutions("boom").await.unwrap_err();
    assert_eq!(err.api_detail(), Some("OpenSearch unreachable"));
    assert!(page.render().contains("Детали: OpenSearch unreachable"));
}

#[tokio::test]
async fn test_ticket_from_result_attaches_solution() {
    let (config, api, state) = setup().await;
    let mut page = SearchController::new(api, &config)
        .with_filter(SourceFilter::from_sources(&[Source::OpenSearch]));

    page.search_solutions("printer jam").await.unwrap();
    let draft = page.select_result(0).unwrap();
    let id = page.submit_ticket(&draft).await.unwrap();
    assert_eq!(id, 1);

    let backend = state.lock().unwrap();
    assert_eq!(backend.tickets[0]["subject"], "Запрос на помощь");
    assert_eq!(backend.tickets[0]["priority"], "normal");
    assert_eq!(backend.tickets[0]["project_id"], 1);
    let (ticket_id, solution) = &backend.solutions[0];
    assert_eq!(*ticket_id, 1);
    assert_eq!(solution["solution"], "Open tray 2 and remove the jammed sheet.");
    assert_eq!(solution["source"], "opensearch");
}

#[tokio::test]
async fn test_create_failure_sends_no_attach() {
    let (config, api, state) = setup().await;
    let mut page = SearchController::new(api, &config);
    page.select_solution("reboot", Source::Mock);

    let draft = TicketDraft::empty(Priority::Normal);
    let err = page.submit_ticket(&draft).await.unwrap_err();
    assert!(matches!(err, DeskError::CreateTicket(_)));
    assert_eq!(err.api_detail(), Some("subject required"));
    assert!(state.lock().unwrap().solutions.is_empty());
}

// ============ Service desk page ============

#[tokio::test]
async fn test_created_ticket_is_listed_first() {
    let (config, api, _state) = setup().await;
    let mut page = TicketController::new(api, &config);

    page.create_ticket(&TicketDraft {
        subject: "Printer".to_string(),
        description: "jams".to_string(),
        priority: Priority::Low,
    })
    .await
    .unwrap();
    let id = page
        .create_ticket(&TicketDraft {
            subject: "Need help".to_string(),
            description: "laptop will not boot".to_string(),
            priority: Priority::Urgent,
        })
        .await
        .unwrap();

    assert_eq!(id, 2);
    let first = &page.tickets()[0];
    assert_eq!(first.id, 2);
    assert_eq!(first.subject, "Need help");
    assert_eq!(first.priority, Priority::Urgent);
    assert_eq!(first.project_id, Some(1));
}

#[tokio::test]
async fn test_comment_round_trip_through_reload() {
    let (config, api, _state) = setup().await;
    let mut page = TicketController::new(api, &config);
    let id = page
        .create_ticket(&TicketDraft {
            subject: "VPN".to_string(),
            description: "cannot connect".to_string(),
            priority: Priority::High,
        })
        .await
        .unwrap();

    page.show_ticket_details(id).unwrap();
    page.add_comment("reinstalled the client").await.unwrap();

    let ticket = page.current_ticket().unwrap();
    assert_eq!(ticket.comments.len(), 1);
    assert!(page.render().contains("30.03.2025 08:15:00"));

    let fetched = page.fetch_ticket(id).await.unwrap();
    assert_eq!(fetched.comments[0].text, "reinstalled the client");
    assert!(matches!(
        page.fetch_ticket(99).await,
        Err(DeskError::TicketNotFound(99))
    ));
}

// ============ Web front end ============

async fn spawn_front_end() -> (String, common::Shared) {
    let (config, api, state) = setup().await;
    let url = common::serve(router(AppState::new(config, api))).await;
    (url, state)
}

#[tokio::test]
async fn test_front_end_health() {
    let (url, _state) = spawn_front_end().await;
    let body: serde_json::Value = reqwest::get(format!("{}/health", url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_front_end_search_with_filters() {
    let (url, state) = spawn_front_end().await;

    let html = reqwest::get(format!("{}/search?q=printer+jam", url))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Найдено решений: 3"));
    assert!(html.contains(r#"value="printer jam""#));

    let html = reqwest::get(format!(
        "{}/search?q=printer%20jam&filtered=1&mediawiki=on",
        url
    ))
    .await
    .unwrap()
    .text()
    .await
    .unwrap();
    assert!(html.contains("Printer FAQ"));
    assert!(!html.contains("Clear the paper path"));

    let searches = state.lock().unwrap().searches.clone();
    assert_eq!(searches[1]["sources"], serde_json::json!(["mediawiki"]));
}

#[tokio::test]
async fn test_front_end_all_box_checks_every_source() {
    let (url, state) = spawn_front_end().await;

    // the panel was last rendered with only mediawiki checked; the user
    // then ticks "all"
    let html = reqwest::get(format!(
        "{}/search?q=printer&filtered=1&prev_all=0&all=on&mediawiki=on",
        url
    ))
    .await
    .unwrap()
    .text()
    .await
    .unwrap();

    assert!(html.contains(r#"id="source-all" name="all" checked>"#));
    assert!(html.contains(r#"id="source-opensearch" name="opensearch" checked>"#));
    assert!(html.contains(r#"id="source-mock" name="mock" checked>"#));
    assert!(html.contains(r#"name="prev_all" value="1""#));
    assert!(html.contains("Найдено решений: 3"));

    let searches = state.lock().unwrap().searches.clone();
    assert_eq!(
        searches[0]["sources"],
        serde_json::json!(["opensearch", "mediawiki", "mock"])
    );

    // unticking "all" clears every source
    let html = reqwest::get(format!(
        "{}/search?q=printer&filtered=1&prev_all=1&opensearch=on&mediawiki=on&mock=on",
        url
    ))
    .await
    .unwrap()
    .text()
    .await
    .unwrap();
    assert!(html.contains(r#"id="source-all" name="all">"#));
    assert!(html.contains(r#"id="source-mock" name="mock">"#));
}

#[tokio::test]
async fn test_front_end_create_ticket_shows_notification() {
    let (url, _state) = spawn_front_end().await;
    let client = reqwest::Client::new();

    let html = client
        .post(format!("{}/servicedesk/tickets", url))
        .form(&[
            ("subject", "Need help"),
            ("description", "laptop will not boot"),
            ("priority", "urgent"),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(html.contains("Заявка #1 успешно создана!"));
    assert!(html.contains("#1: Need help"));
    assert!(html.contains(r#"<span class="badge bg-danger me-2">urgent</span>"#));
}

#[tokio::test]
async fn test_front_end_ticket_from_search_result() {
    let (url, state) = spawn_front_end().await;
    let client = reqwest::Client::new();

    let html = client
        .post(format!("{}/search/select", url))
        .form(&[("solution", "Remove the jammed sheet."), ("source", "opensearch")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"action="/search/ticket""#));
    assert!(html.contains("Источник: OpenSearch"));

    let response = client
        .post(format!("{}/search/ticket", url))
        .form(&[
            ("solution", "Remove the jammed sheet."),
            ("source", "opensearch"),
            ("subject", "Запрос на помощь"),
            ("description", "Мне нужна помощь с проблемой."),
            ("priority", "normal"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/search");
    assert_eq!(response.url().query(), None);
    let html = response.text().await.unwrap();
    assert!(html.contains("Заявка #1 успешно создана!"));
    assert_eq!(state.lock().unwrap().solutions.len(), 1);
}

#[tokio::test]
async fn test_front_end_comment_and_details() {
    let (url, _state) = spawn_front_end().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/servicedesk/tickets", url))
        .form(&[("subject", "VPN"), ("description", "down"), ("priority", "high")])
        .send()
        .await
        .unwrap();

    let html = client
        .post(format!("{}/servicedesk/tickets/1/comment", url))
        .form(&[("comment", "still down")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(r#"id="ticket-details""#));
    assert!(html.contains("still down"));
    assert!(html.contains("Комментарий добавлен"));

    let html = client
        .post(format!("{}/servicedesk/tickets/1/comment", url))
        .form(&[("comment", "   ")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Комментарий не может быть пустым"));
}
