//! Search page: query the backend, filter by source, hand a chosen solution
//! over to ticket creation.
//!
//! [`SearchController`] owns the page state: the last full result set, the
//! source filter panel, and the solution picked for a new ticket. Rendering
//! is derived from that state on demand via [`SearchController::render`].

use anyhow::Result;
use std::sync::Arc;

use crate::api::{ApiError, HelpdeskApi};
use crate::config::Config;
use crate::error::DeskError;
use crate::filter::SourceFilter;
use crate::models::{
    NewTicket, SearchRequest, SearchResponse, SearchResult, SolutionAttachment, Source,
};
use crate::render::{self, TicketDraft};

/// Solution captured from a result card, waiting to be attached to a ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub solution: String,
    pub source: Source,
}

/// What the results area currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchView {
    Idle,
    Loading,
    NotFound,
    Failed { detail: Option<String> },
    Results,
}

pub struct SearchController {
    api: Arc<dyn HelpdeskApi>,
    preview_chars: usize,
    project_id: u64,
    all_results: Vec<SearchResult>,
    filter: SourceFilter,
    selection: Option<Selection>,
    view: SearchView,
}

impl SearchController {
    pub fn new(api: Arc<dyn HelpdeskApi>, config: &Config) -> Self {
        Self {
            api,
            preview_chars: config.ui.content_preview_chars,
            project_id: config.backend.project_id,
            all_results: Vec::new(),
            filter: SourceFilter::default(),
            selection: None,
            view: SearchView::Idle,
        }
    }

    pub fn with_filter(mut self, filter: SourceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> &SourceFilter {
        &self.filter
    }

    pub fn all_results(&self) -> &[SearchResult] {
        &self.all_results
    }

    pub fn view(&self) -> &SearchView {
        &self.view
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Validates the query and switches the view to loading. Returns the
    /// request to send.
    pub fn begin_search(&mut self, query: &str) -> Result<SearchRequest, DeskError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DeskError::EmptyQuery);
        }

        self.view = SearchView::Loading;
        Ok(SearchRequest {
            query: query.to_string(),
            sources: self.filter.checked_sources(),
            debug: true,
        })
    }

    /// Applies the backend's answer. A non-empty result set replaces the
    /// previous one wholesale. Returns the number of results received.
    pub fn finish_search(
        &mut self,
        outcome: Result<SearchResponse, ApiError>,
    ) -> Result<usize, DeskError> {
        match outcome {
            Ok(response) if !response.results.is_empty() => {
                self.all_results = response.results;
                self.view = SearchView::Results;
                Ok(self.all_results.len())
            }
            Ok(_) => {
                self.all_results.clear();
                self.view = SearchView::NotFound;
                Ok(0)
            }
            Err(e) => {
                tracing::warn!(error = %e, "search failed");
                self.view = SearchView::Failed {
                    detail: e.detail().map(str::to_string),
                };
                Err(DeskError::Search(e))
            }
        }
    }

    pub async fn search_solutions(&mut self, query: &str) -> Result<usize, DeskError> {
        let request = self.begin_search(query)?;
        tracing::debug!(query = %request.query, sources = ?request.sources, "sending search request");

        let outcome = self.api.search(&request).await;
        let count = self.finish_search(outcome)?;
        tracing::info!(query = %request.query, results = count, "search finished");
        Ok(count)
    }

    /// Results that pass the current source filter, in backend order.
    pub fn apply_filters(&self) -> Vec<&SearchResult> {
        self.filter.apply(&self.all_results)
    }

    /// The "all sources" checkbox.
    pub fn set_all_sources(&mut self, checked: bool) {
        self.filter.set_all(checked);
    }

    /// A single per-source checkbox; the "all" box follows automatically.
    pub fn set_source(&mut self, source: &Source, checked: bool) {
        self.filter.set(source, checked);
    }

    pub fn render(&self) -> String {
        match &self.view {
            SearchView::Idle => String::new(),
            SearchView::Loading => render::render_search_loading(),
            SearchView::NotFound => render::render_search_not_found(),
            SearchView::Failed { detail } => render::render_search_error(detail.as_deref()),
            SearchView::Results => render::render_results(&self.apply_filters(), self.preview_chars),
        }
    }

    /// Picks the `index`-th visible result for a new ticket.
    pub fn select_result(&mut self, index: usize) -> Result<TicketDraft, DeskError> {
        let picked = self
            .apply_filters()
            .get(index)
            .map(|r| (r.content.clone(), r.source.clone()))
            .ok_or(DeskError::NoSelection)?;
        Ok(self.select_solution(picked.0, picked.1))
    }

    /// Captures a solution directly, as posted back from a result card.
    pub fn select_solution(&mut self, solution: impl Into<String>, source: Source) -> TicketDraft {
        self.selection = Some(Selection {
            solution: solution.into(),
            source,
        });
        TicketDraft::from_solution()
    }

    pub fn cancel_ticket(&mut self) {
        self.selection = None;
    }

    /// Creates a ticket and then attaches the selected solution to it.
    ///
    /// The attach request is only sent once the ticket exists. If it fails the
    /// ticket stays and the error names it. The selection is cleared only when
    /// both steps succeed.
    pub async fn submit_ticket(&mut self, draft: &TicketDraft) -> Result<u64, DeskError> {
        let selection = self.selection.clone().ok_or(DeskError::NoSelection)?;

        let new_ticket = NewTicket {
            subject: draft.subject.clone(),
            description: draft.description.clone(),
            priority: draft.priority.clone(),
            project_id: self.project_id,
            assigned_to: None,
        };
        let created = self
            .api
            .create_ticket(&new_ticket)
            .await
            .map_err(DeskError::CreateTicket)?;
        tracing::info!(ticket_id = created.id, "ticket created from search result");

        let attachment = SolutionAttachment {
            solution: selection.solution,
            source: selection.source,
        };
        self.api
            .attach_solution(created.id, &attachment)
            .await
            .map_err(|source| DeskError::AttachSolution {
                ticket_id: created.id,
                source,
            })?;

        self.selection = None;
        Ok(created.id)
    }
}

/// CLI entry point for `hdc search`.
///
/// Prints the filtered results. With `pick`, creates a ticket from that
/// (1-based) visible result and attaches its solution.
pub async fn run_search(
    config: &Config,
    api: Arc<dyn HelpdeskApi>,
    query: &str,
    sources: Vec<Source>,
    pick: Option<usize>,
    draft: TicketDraft,
) -> Result<()> {
    let filter = if sources.is_empty() {
        SourceFilter::all_checked()
    } else {
        SourceFilter::from_sources(&sources)
    };
    let mut page = SearchController::new(api, config).with_filter(filter);

    match page.search_solutions(query).await {
        Ok(0) => {
            println!("No results.");
            return Ok(());
        }
        Ok(_) => {}
        Err(e) => {
            let message = render::user_message(&e);
            return Err(anyhow::Error::new(e).context(message));
        }
    }

    let visible = page.apply_filters();
    if visible.is_empty() {
        println!("No results match the selected sources.");
        return Ok(());
    }

    for (i, result) in visible.iter().enumerate() {
        println!(
            "{}. [{}] {} / {}",
            i + 1,
            render::format_score(result.score),
            render::source_label(&result.source),
            result.title
        );
        if let Some(ref url) = result.url {
            println!("    url: {}", url);
        }
        if !result.tags.is_empty() {
            println!("    tags: {}", result.tags.join(", "));
        }
        println!(
            "    excerpt: \"{}\"",
            render::preview_content(&result.content, config.ui.content_preview_chars)
                .replace('\n', " ")
        );
        println!();
    }

    if let Some(n) = pick {
        if n == 0 {
            anyhow::bail!("--ticket is 1-based");
        }
        let defaults = page.select_result(n - 1)?;
        let draft = TicketDraft {
            subject: non_empty_or(draft.subject, defaults.subject),
            description: non_empty_or(draft.description, defaults.description),
            priority: draft.priority,
        };
        match page.submit_ticket(&draft).await {
            Ok(id) => println!("{}", render::ticket_created_message(id)),
            Err(e) => {
                let message = render::user_message(&e);
                return Err(anyhow::Error::new(e).context(message));
            }
        }
    }

    Ok(())
}

fn non_empty_or(value: String, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
