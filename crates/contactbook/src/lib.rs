//! `contactbook` - A server-rendered contact book
//!
//! Contacts (name, email, phone) live in a single JSON file. The library
//! provides the store, a name-keyed repository over it, form validation,
//! flash messages, and the axum routes that tie them together.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod contact;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod render;
pub mod repository;
pub mod server;
pub mod session;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use contact::{Collection, Contact, ContactForm};
pub use error::{Error, Result};
pub use handlers::{ContactHandlers, Outcome};
pub use logging::init_logging;
pub use repository::ContactRepository;
pub use server::{build_router, serve, AppState};
pub use storage::RecordStore;
