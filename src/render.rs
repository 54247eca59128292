//! HTML rendering for the search and service-desk pages.
//!
//! Every function here is a pure mapping from data to an HTML fragment. The
//! controllers decide *what* to show; this module decides how it looks. Plain
//! text is always escaped; the only markup passed through verbatim is the
//! backend's pre-rendered search highlight.

use crate::error::DeskError;
use crate::filter::SourceFilter;
use crate::models::{Priority, SearchResult, Source, Status, Ticket};
use crate::notify::NotificationCenter;
use crate::util::{format_date, html_escape};

// ============ Labels and badge classes ============

pub fn source_label(source: &Source) -> &'static str {
    match source {
        Source::OpenSearch => "OpenSearch",
        Source::MediaWiki => "MediaWiki",
        Source::Mock => "База знаний (демо)",
        Source::Unknown(_) => "Неизвестный источник",
    }
}

pub fn source_badge_class(source: &Source) -> &'static str {
    match source {
        Source::OpenSearch => "badge bg-primary source-badge-opensearch",
        Source::MediaWiki => "badge bg-success source-badge-mediawiki",
        Source::Mock => "badge bg-secondary source-badge-mock",
        Source::Unknown(_) => "badge bg-secondary",
    }
}

pub fn priority_badge_class(priority: &Priority) -> &'static str {
    match priority {
        Priority::Low => "bg-secondary",
        Priority::Normal => "bg-primary",
        Priority::High => "bg-warning",
        Priority::Urgent => "bg-danger",
        Priority::Other(_) => "bg-primary",
    }
}

pub fn status_badge_class(status: &Status) -> &'static str {
    match status {
        Status::New => "bg-info",
        Status::InProgress => "bg-primary",
        Status::Resolved => "bg-success",
        Status::Closed => "bg-secondary",
        Status::Other(_) => "bg-info",
    }
}

/// Relevance rounded to one decimal, half up, without a trailing `.0`.
pub fn format_score(score: f64) -> String {
    let rounded = (score * 10.0 + 0.5).floor() / 10.0;
    format!("{}", rounded)
}

/// Cuts `content` to `max_chars` characters, appending `...` when cut.
pub fn preview_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() > max_chars {
        let mut cut: String = content.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        content.to_string()
    }
}

// ============ Search page ============

pub fn render_search_loading() -> String {
    r#"<div class="text-center"><div class="spinner-border text-success" role="status"></div><p class="mt-2">Поиск решений...</p></div>"#
        .to_string()
}

pub fn render_search_not_found() -> String {
    r#"<div class="alert alert-warning">Решений не найдено. Попробуйте изменить запрос.</div>"#
        .to_string()
}

pub fn render_no_filtered_results() -> String {
    r#"<div class="alert alert-warning">Нет результатов, соответствующих выбранным фильтрам.</div>"#
        .to_string()
}

pub fn render_search_error(detail: Option<&str>) -> String {
    let mut message =
        "Произошла ошибка при поиске. Пожалуйста, попробуйте еще раз.".to_string();
    if let Some(detail) = detail {
        message.push_str(&format!(
            r#"<br><small class="text-muted">Детали: {}</small>"#,
            html_escape(detail)
        ));
    }
    format!(r#"<div class="alert alert-danger">{}</div>"#, message)
}

/// Query box plus the source filter panel. `filtered=1` marks a submission
/// from this form, so unchecked boxes can be told apart from a bare link.
/// `prev_all` records the "all" box as rendered, so a submission can tell
/// whether the user toggled it.
pub fn render_search_form(query: &str, filter: &SourceFilter) -> String {
    let checkbox = |id: &str, name: &str, label: &str, checked: bool| {
        format!(
            r#"<div class="form-check form-check-inline"><input class="form-check-input source-filter" type="checkbox" id="{id}" name="{name}"{checked}><label class="form-check-label" for="{id}">{label}</label></div>"#,
            id = id,
            name = name,
            label = label,
            checked = if checked { " checked" } else { "" },
        )
    };

    let mut boxes = checkbox("source-all", "all", "Все источники", filter.is_all());
    for source in Source::KNOWN.iter() {
        boxes.push_str(&checkbox(
            &format!("source-{}", source.as_str()),
            source.as_str(),
            source_label(source),
            filter.is_checked(source),
        ));
    }

    format!(
        r#"<form id="search-form" method="get" action="/search" class="mb-3">
<div class="input-group mb-2"><input id="search-input" class="form-control" name="q" value="{query}" placeholder="Опишите проблему"><button id="search-button" type="submit" class="btn btn-success">Найти</button></div>
<input type="hidden" name="filtered" value="1">
<input type="hidden" name="prev_all" value="{prev_all}">
<div id="source-filters">{boxes}</div>
</form>
"#,
        query = html_escape(query),
        prev_all = if filter.is_all() { "1" } else { "0" },
        boxes = boxes,
    )
}

/// Renders the visible result cards in the order given.
pub fn render_results(results: &[&SearchResult], preview_chars: usize) -> String {
    if results.is_empty() {
        return render_no_filtered_results();
    }

    let mut html = format!("<h4>Найдено решений: {}</h4>", results.len());
    for result in results {
        html.push_str(&render_result_card(result, preview_chars));
    }
    html
}

fn render_result_card(result: &SearchResult, preview_chars: usize) -> String {
    let content = match &result.highlight {
        Some(highlight) if !highlight.is_empty() => highlight.replace('\n', "<br>"),
        _ => html_escape(&preview_content(&result.content, preview_chars)),
    };

    let tags = if result.tags.is_empty() {
        String::new()
    } else {
        let badges: String = result
            .tags
            .iter()
            .map(|t| format!(r#"<span class="badge bg-light text-dark me-1">{}</span>"#, html_escape(t)))
            .collect();
        format!(r#"<div class="mt-2"><strong>Теги:</strong> {}</div>"#, badges)
    };

    let link = match &result.url {
        Some(url) if !url.is_empty() => format!(
            r#"<a href="{}" target="_blank" class="btn btn-outline-primary btn-sm me-2">Перейти к источнику</a>"#,
            html_escape(url)
        ),
        _ => String::new(),
    };

    let solution = html_escape(&result.content);
    let source = html_escape(result.source.as_str());

    format!(
        r#"<div class="card mb-3">
<div class="card-header d-flex justify-content-between align-items-center">
<h5 class="mb-0">{title}</h5>
<div><span class="{badge_class}">{label}</span> <span class="badge bg-info ms-1">Релевантность: {score}</span></div>
</div>
<div class="card-body">
<p class="card-text">{content}</p>
{tags}
<div class="mt-2">{link}<form method="post" action="/search/select" class="d-inline">
<input type="hidden" name="solution" value="{solution}">
<input type="hidden" name="source" value="{source}">
<button type="submit" class="btn btn-success btn-sm create-ticket-btn" data-solution="{solution}" data-source="{source}">Создать заявку с этим решением</button>
</form></div>
</div>
</div>
"#,
        title = html_escape(&result.title),
        badge_class = source_badge_class(&result.source),
        label = source_label(&result.source),
        score = format_score(result.score),
        content = content,
        tags = tags,
        link = link,
        solution = solution,
        source = source,
    )
}

/// Preview of the solution captured from a result card.
pub fn render_selected_solution(solution: &str, source: &Source) -> String {
    format!(
        r#"<div id="selected-solution" class="alert alert-light"><p id="solution-content">{}</p><small id="solution-source" class="text-muted">Источник: {}</small></div>"#,
        html_escape(solution),
        source_label(source)
    )
}

/// Values pre-filled into a ticket form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub subject: String,
    pub description: String,
    pub priority: Priority,
}

impl TicketDraft {
    pub fn empty(priority: Priority) -> Self {
        Self {
            subject: String::new(),
            description: String::new(),
            priority,
        }
    }

    /// Draft offered when a search result is chosen.
    pub fn from_solution() -> Self {
        Self {
            subject: "Запрос на помощь".to_string(),
            description: "Мне нужна помощь с проблемой.".to_string(),
            priority: Priority::Normal,
        }
    }
}

/// Ticket creation form. `hidden` fields are carried along unchanged.
pub fn render_ticket_form(draft: &TicketDraft, action: &str, hidden: &[(&str, &str)]) -> String {
    let hidden_inputs: String = hidden
        .iter()
        .map(|(name, value)| {
            format!(
                r#"<input type="hidden" name="{}" value="{}">"#,
                html_escape(name),
                html_escape(value)
            )
        })
        .collect();

    let options: String = [
        Priority::Low,
        Priority::Normal,
        Priority::High,
        Priority::Urgent,
    ]
    .iter()
    .map(|p| {
        let selected = if *p == draft.priority { " selected" } else { "" };
        format!(r#"<option value="{0}"{1}>{0}</option>"#, p.as_str(), selected)
    })
    .collect();

    format!(
        r#"<form id="ticket-form" method="post" action="{action}" class="card card-body mb-3">
{hidden}
<input id="ticket-subject" class="form-control mb-2" name="subject" value="{subject}" required>
<textarea id="ticket-description" class="form-control mb-2" name="description" rows="4">{description}</textarea>
<select id="ticket-priority" class="form-select mb-2" name="priority">{options}</select>
<div><button id="submit-ticket" type="submit" class="btn btn-primary">Создать заявку</button> <a id="cancel-ticket" class="btn btn-secondary" href="{cancel}">Отмена</a></div>
</form>
"#,
        action = html_escape(action),
        hidden = hidden_inputs,
        subject = html_escape(&draft.subject),
        description = html_escape(&draft.description),
        options = options,
        cancel = if action.starts_with("/search") { "/search" } else { "/servicedesk" },
    )
}

// ============ Service desk page ============

pub fn render_ticket_list(tickets: &[Ticket]) -> String {
    if tickets.is_empty() {
        return r#"<div class="text-center text-muted py-4"><p>У вас пока нет заявок</p></div>"#
            .to_string();
    }

    tickets.iter().map(render_ticket_card).collect()
}

fn render_ticket_card(ticket: &Ticket) -> String {
    format!(
        r#"<div class="card mb-2 ticket-item" data-ticket-id="{id}">
<div class="card-body">
<div class="d-flex justify-content-between align-items-center">
<h5 class="card-title mb-0"><a class="stretched-link text-reset" href="/servicedesk?ticket={id}">#{id}: {subject}</a></h5>
<span class="badge {status_class}">{status}</span>
</div>
<div class="d-flex mt-2"><span class="badge {priority_class} me-2">{priority}</span><small class="text-muted">{date}</small></div>
</div>
</div>
"#,
        id = ticket.id,
        subject = html_escape(&ticket.subject),
        status_class = status_badge_class(&ticket.status),
        status = html_escape(ticket.status.as_str()),
        priority_class = priority_badge_class(&ticket.priority),
        priority = html_escape(ticket.priority.as_str()),
        date = html_escape(&format_date(ticket.created_on.as_deref())),
    )
}

pub fn render_tickets_load_error() -> String {
    r#"<div class="alert alert-danger">Ошибка при загрузке заявок. Попробуйте обновить страницу.</div>"#
        .to_string()
}

pub fn render_ticket_details(ticket: &Ticket) -> String {
    let comments = if ticket.comments.is_empty() {
        r#"<p class="text-muted">Нет комментариев</p>"#.to_string()
    } else {
        ticket
            .comments
            .iter()
            .map(|c| {
                format!(
                    r#"<div class="card mb-2"><div class="card-body"><p class="card-text">{}</p><small class="text-muted">{}</small></div></div>
"#,
                    html_escape(&c.text),
                    html_escape(&format_date(c.created_on.as_deref()))
                )
            })
            .collect()
    };

    format!(
        r#"<div id="ticket-details" class="card">
<div class="card-body">
<h4 id="ticket-details-subject">#{id}: {subject}</h4>
<div class="mb-2"><span id="ticket-details-status" class="badge {status_class}">{status}</span><span id="ticket-details-priority" class="badge {priority_class} ms-2">{priority}</span> <small id="ticket-details-date" class="text-muted">{date}</small></div>
<p id="ticket-details-description">{description}</p>
<h5>Комментарии</h5>
<div id="ticket-comments">{comments}</div>
<form method="post" action="/servicedesk/tickets/{id}/comment" class="mt-3">
<textarea id="new-comment" class="form-control mb-2" name="comment" rows="2"></textarea>
<button id="add-comment" type="submit" class="btn btn-primary btn-sm">Добавить комментарий</button>
<a id="back-to-list" class="btn btn-link btn-sm" href="/servicedesk">К списку заявок</a>
</form>
</div>
</div>
"#,
        id = ticket.id,
        subject = html_escape(&ticket.subject),
        status_class = status_badge_class(&ticket.status),
        status = html_escape(ticket.status.as_str()),
        priority_class = priority_badge_class(&ticket.priority),
        priority = html_escape(ticket.priority.as_str()),
        date = html_escape(&format_date(ticket.created_on.as_deref())),
        description = html_escape(&ticket.description),
        comments = comments,
    )
}

// ============ Notifications and messages ============

/// Renders the notification container, or nothing if it was never created.
pub fn render_notifications(center: &NotificationCenter) -> String {
    if !center.has_container() {
        return String::new();
    }

    let alerts: String = center
        .active()
        .iter()
        .map(|n| {
            format!(
                r#"<div class="alert alert-{} alert-dismissible fade show" role="alert" data-notification-id="{}">{}<button type="button" class="btn-close" data-bs-dismiss="alert" aria-label="Close"></button></div>"#,
                n.kind.as_str(),
                n.id,
                html_escape(&n.message)
            )
        })
        .collect();

    format!(
        r#"<div id="notifications-container" class="position-fixed top-0 end-0 p-3" style="z-index: 1050;">{}</div>"#,
        alerts
    )
}

pub fn ticket_created_message(ticket_id: u64) -> String {
    format!("Заявка #{} успешно создана!", ticket_id)
}

/// User-facing text for a failed operation, with server detail appended
/// where the page shows it.
pub fn user_message(err: &DeskError) -> String {
    let with_detail = |base: &str| match err.api_detail() {
        Some(detail) => format!("{}: {}", base, detail),
        None => base.to_string(),
    };

    match err {
        DeskError::EmptyQuery => "Пожалуйста, введите поисковый запрос".to_string(),
        DeskError::EmptyComment => "Комментарий не может быть пустым".to_string(),
        DeskError::NoSelection => "Не выбрано решение для заявки".to_string(),
        DeskError::NoCurrentTicket => "Не выбрана заявка".to_string(),
        DeskError::TicketNotFound(id) => format!("Заявка #{} не найдена", id),
        DeskError::Search(_) => {
            with_detail("Произошла ошибка при поиске. Пожалуйста, попробуйте еще раз")
        }
        DeskError::LoadTickets(_) => {
            "Ошибка при загрузке заявок. Попробуйте обновить страницу.".to_string()
        }
        DeskError::CreateTicket(_) => with_detail("Ошибка при создании заявки"),
        DeskError::AttachSolution { ticket_id, .. } => with_detail(&format!(
            "Заявка #{} создана, но произошла ошибка при прикреплении решения к заявке",
            ticket_id
        )),
        DeskError::AddComment(_) => with_detail("Ошибка при добавлении комментария"),
    }
}
