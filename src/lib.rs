//! # Helpdesk client
//!
//! Client-side logic for a helpdesk: a knowledge-base search page and a
//! service-desk page, both driven against the helpdesk backend's REST API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────┐   ┌─────────────┐
//! │   CLI    │──▶│ SearchController │──▶│             │
//! │  (hdc)   │   │ TicketController │   │ HelpdeskApi │──▶ backend
//! └──────────┘   └────────┬─────────┘   │  (HttpApi)  │    /api/...
//! ┌──────────┐            │             └─────────────┘
//! │  Web UI  │────────────┘
//! │  (axum)  │      render: state ──▶ HTML
//! └──────────┘
//! ```
//!
//! Controllers own their page state explicitly; rendering is a pure function
//! of that state.
//!
//! ## Quick Start
//!
//! ```bash
//! hdc search "printer jam"
//! hdc tickets list
//! hdc serve                     # web front end on 127.0.0.1:8080
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Wire types for the backend API |
//! | [`api`] | Backend API trait and HTTP client |
//! | [`error`] | Operation errors |
//! | [`util`] | Date formatting, URL parameters, HTML escaping |
//! | [`notify`] | Timed notifications |
//! | [`filter`] | Source filter panel |
//! | [`render`] | HTML fragments |
//! | [`search`] | Search page controller |
//! | [`servicedesk`] | Service-desk page controller |
//! | [`server`] | Web front end |

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod notify;
pub mod render;
pub mod search;
pub mod server;
pub mod servicedesk;
pub mod util;
