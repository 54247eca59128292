//! Service-desk page: list tickets, show one with its comments, create
//! tickets and add comments.
//!
//! The controller never edits its ticket collection by hand. After every
//! successful create or comment it re-fetches the whole collection, so what
//! is shown is always the server's state and never a local guess.

use anyhow::Result;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::api::{ApiError, HelpdeskApi};
use crate::config::Config;
use crate::error::DeskError;
use crate::models::{CommentRequest, NewTicket, Priority, Ticket};
use crate::render::{self, TicketDraft};
use crate::util::{format_date, parse_timestamp};

/// Which panel sits next to the ticket list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    List,
    Form,
    Details,
}

/// Sorts newest `created_on` first. Tickets whose timestamp is missing or
/// unparseable go last, in their original order.
pub fn sort_tickets(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| {
        let a = a.created_on.as_deref().and_then(parse_timestamp);
        let b = b.created_on.as_deref().and_then(parse_timestamp);
        match (a, b) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

pub struct TicketController {
    api: Arc<dyn HelpdeskApi>,
    project_id: u64,
    default_priority: Priority,
    tickets: Vec<Ticket>,
    current_ticket_id: Option<u64>,
    panel: Panel,
    load_failed: bool,
}

impl TicketController {
    pub fn new(api: Arc<dyn HelpdeskApi>, config: &Config) -> Self {
        Self {
            api,
            project_id: config.backend.project_id,
            default_priority: config.ui.default_priority.clone(),
            tickets: Vec::new(),
            current_ticket_id: None,
            panel: Panel::List,
            load_failed: false,
        }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn current_ticket_id(&self) -> Option<u64> {
        self.current_ticket_id
    }

    pub fn current_ticket(&self) -> Option<&Ticket> {
        let id = self.current_ticket_id?;
        self.tickets.iter().find(|t| t.id == id)
    }

    /// Fetches the full collection and replaces the local copy.
    pub async fn load_tickets(&mut self) -> Result<usize, DeskError> {
        match self.api.list_tickets().await {
            Ok(tickets) => {
                self.tickets = tickets;
                self.load_failed = false;
                sort_tickets(&mut self.tickets);
                tracing::debug!(count = self.tickets.len(), "tickets loaded");
                Ok(self.tickets.len())
            }
            Err(e) => {
                tracing::warn!(error = %e, "loading tickets failed");
                self.load_failed = true;
                Err(DeskError::LoadTickets(e))
            }
        }
    }

    /// Like [`load_tickets`](Self::load_tickets), then runs `on_complete`
    /// against the fresh state. The continuation is skipped if loading fails.
    pub async fn load_tickets_then<F>(&mut self, on_complete: F) -> Result<usize, DeskError>
    where
        F: FnOnce(&mut Self),
    {
        let count = self.load_tickets().await?;
        on_complete(self);
        Ok(count)
    }

    /// Sorts the held collection in place and renders the list.
    pub fn update_tickets_list(&mut self) -> String {
        sort_tickets(&mut self.tickets);
        self.render_list()
    }

    pub fn render_list(&self) -> String {
        if self.load_failed {
            render::render_tickets_load_error()
        } else {
            render::render_ticket_list(&self.tickets)
        }
    }

    /// Opens the detail panel for a ticket already in the collection.
    pub fn show_ticket_details(&mut self, ticket_id: u64) -> Result<String, DeskError> {
        let ticket = self
            .tickets
            .iter()
            .find(|t| t.id == ticket_id)
            .ok_or(DeskError::TicketNotFound(ticket_id))?;
        let html = render::render_ticket_details(ticket);
        self.current_ticket_id = Some(ticket_id);
        self.panel = Panel::Details;
        Ok(html)
    }

    /// Fetches a single ticket straight from the backend.
    pub async fn fetch_ticket(&self, ticket_id: u64) -> Result<Ticket, DeskError> {
        match self.api.get_ticket(ticket_id).await {
            Ok(ticket) => Ok(ticket),
            Err(ApiError::Status { status: 404, .. }) => Err(DeskError::TicketNotFound(ticket_id)),
            Err(e) => Err(DeskError::LoadTickets(e)),
        }
    }

    pub fn open_new_ticket_form(&mut self) -> TicketDraft {
        self.panel = Panel::Form;
        TicketDraft::empty(self.default_priority.clone())
    }

    /// Hides the form; returns the reset form values.
    pub fn cancel_ticket_form(&mut self) -> TicketDraft {
        self.panel = Panel::List;
        TicketDraft::empty(self.default_priority.clone())
    }

    pub fn back_to_list(&mut self) {
        self.panel = Panel::List;
        self.current_ticket_id = None;
    }

    /// Creates a ticket, then reloads the collection.
    ///
    /// Returns the new id once the create request succeeds. A failed reload
    /// afterwards does not undo that; it shows up as the list's load error.
    pub async fn create_ticket(&mut self, draft: &TicketDraft) -> Result<u64, DeskError> {
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
        tracing::info!(ticket_id = created.id, "ticket created");

        // reload failure is already recorded in load_failed
        let _ = self.load_tickets().await;
        self.panel = Panel::List;
        Ok(created.id)
    }

    /// Adds a comment to the open ticket, reloads, and re-opens its details
    /// so the server-assigned comment timestamp is shown.
    pub async fn add_comment(&mut self, text: &str) -> Result<(), DeskError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DeskError::EmptyComment);
        }
        let ticket_id = self.current_ticket_id.ok_or(DeskError::NoCurrentTicket)?;

        self.api
            .add_comment(
                ticket_id,
                &CommentRequest {
                    comment: text.to_string(),
                },
            )
            .await
            .map_err(DeskError::AddComment)?;
        tracing::info!(ticket_id, "comment added");

        self.load_tickets_then(|page| {
            if page.show_ticket_details(ticket_id).is_err() {
                page.back_to_list();
            }
        })
        .await?;
        Ok(())
    }

    /// The list plus whichever side panel is open.
    pub fn render(&self) -> String {
        let side = match self.panel {
            Panel::Details => self
                .current_ticket()
                .map(render::render_ticket_details)
                .unwrap_or_default(),
            Panel::Form => render::render_ticket_form(
                &TicketDraft::empty(self.default_priority.clone()),
                "/servicedesk/tickets",
                &[],
            ),
            Panel::List => String::new(),
        };
        format!(
            r#"<div id="tickets-container">{}</div>{}"#,
            self.render_list(),
            side
        )
    }
}

// ============ CLI entry points ============

fn print_ticket_line(ticket: &Ticket) {
    println!(
        "#{:<5} {:<12} {:<8} {}  {}",
        ticket.id,
        ticket.status,
        ticket.priority,
        format_date(ticket.created_on.as_deref()),
        ticket.subject
    );
}

fn to_anyhow(e: DeskError) -> anyhow::Error {
    let message = render::user_message(&e);
    anyhow::Error::new(e).context(message)
}

/// `hdc tickets list`.
pub async fn run_list(config: &Config, api: Arc<dyn HelpdeskApi>) -> Result<()> {
    let mut page = TicketController::new(api, config);
    page.load_tickets().await.map_err(to_anyhow)?;

    if page.tickets().is_empty() {
        println!("У вас пока нет заявок");
        return Ok(());
    }
    for ticket in page.tickets() {
        print_ticket_line(ticket);
    }
    Ok(())
}

/// `hdc tickets show <id>`.
pub async fn run_show(config: &Config, api: Arc<dyn HelpdeskApi>, ticket_id: u64) -> Result<()> {
    let page = TicketController::new(api, config);
    let ticket = page.fetch_ticket(ticket_id).await.map_err(to_anyhow)?;

    println!("--- Ticket #{} ---", ticket.id);
    println!("subject:     {}", ticket.subject);
    println!("status:      {}", ticket.status);
    println!("priority:    {}", ticket.priority);
    println!("created_on:  {}", format_date(ticket.created_on.as_deref()));
    println!();
    println!("--- Description ---");
    println!("{}", ticket.description);
    println!();
    println!("--- Comments ({}) ---", ticket.comments.len());
    if ticket.comments.is_empty() {
        println!("Нет комментариев");
    }
    for comment in &ticket.comments {
        println!("[{}]", format_date(comment.created_on.as_deref()));
        println!("{}", comment.text);
        println!();
    }
    Ok(())
}

/// `hdc tickets create`.
pub async fn run_create(
    config: &Config,
    api: Arc<dyn HelpdeskApi>,
    draft: TicketDraft,
) -> Result<()> {
    let mut page = TicketController::new(api, config);
    let id = page.create_ticket(&draft).await.map_err(to_anyhow)?;
    println!("{}", render::ticket_created_message(id));
    Ok(())
}

/// `hdc tickets comment <id> <text>`.
pub async fn run_comment(
    config: &Config,
    api: Arc<dyn HelpdeskApi>,
    ticket_id: u64,
    text: &str,
) -> Result<()> {
    let mut page = TicketController::new(api, config);
    page.load_tickets().await.map_err(to_anyhow)?;
    page.show_ticket_details(ticket_id).map_err(to_anyhow)?;
    page.add_comment(text).await.map_err(to_anyhow)?;

    let count = page.current_ticket().map_or(0, |t| t.comments.len());
    println!("Comment added to #{} ({} comments).", ticket_id, count);
    Ok(())
}
