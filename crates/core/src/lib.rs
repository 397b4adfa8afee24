#![warn(clippy::all, missing_docs)]

//! Core domain logic for the SportPro club client.
//!
//! This crate hosts the wire models, the HTTP adapter and its typed errors,
//! configuration, local persistence (session token and cart), and the
//! controllers behind each screen of the terminal UI.

pub mod api;
pub mod cart;
pub mod config;
pub mod contact;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod http;
pub mod models;
pub mod session;
pub mod storage;
pub mod views;

pub use api::{check_connection, ClubApi, EquipmentQuery, NewsPage};
pub use cart::{CartEntry, CartStore};
pub use config::{AppConfig, FilterPolicy};
pub use contact::{ContactController, ContactField, ContactForm};
pub use error::{ClientError, ClientResult, NetworkError};
pub use fetch::{FetchState, RequestTracker, Ticket};
pub use filter::{derive, EquipmentFilters, SortKey};
pub use http::HttpClient;
pub use models::{
    AuthResponse, ContactMessage, Credentials, EquipmentItem, EventItem, NewsItem, PageMeta,
    Registration, User,
};
pub use session::Session;
pub use storage::LocalStore;
