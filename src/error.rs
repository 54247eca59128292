//! Error types for backend calls and page controllers.

use crate::api::ApiError;

/// Failure of a user-triggered operation on one of the two pages.
///
/// Every backend failure is wrapped with the step that failed, so a partial
/// multi-step failure (ticket created, solution not attached) can name the
/// ticket that now exists.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error("comment is empty")]
    EmptyComment,

    #[error("no search result selected")]
    NoSelection,

    #[error("no ticket is open")]
    NoCurrentTicket,

    #[error("ticket not found: {0}")]
    TicketNotFound(u64),

    #[error("search failed: {0}")]
    Search(#[source] ApiError),

    #[error("loading tickets failed: {0}")]
    LoadTickets(#[source] ApiError),

    #[error("creating ticket failed: {0}")]
    CreateTicket(#[source] ApiError),

    #[error("ticket #{ticket_id} was created but attaching the solution failed: {source}")]
    AttachSolution {
        ticket_id: u64,
        #[source]
        source: ApiError,
    },

    #[error("adding comment failed: {0}")]
    AddComment(#[source] ApiError),
}

impl DeskError {
    /// Server-provided detail from the `{error}` envelope, if any.
    pub fn api_detail(&self) -> Option<&str> {
        match self {
            DeskError::Search(e)
            | DeskError::LoadTickets(e)
            | DeskError::CreateTicket(e)
            | DeskError::AttachSolution { source: e, .. }
            | DeskError::AddComment(e) => e.detail(),
            _ => None,
        }
    }
}
