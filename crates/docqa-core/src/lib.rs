//! Ingestion and question-answering pipelines, session store, and configuration.

pub mod config;
pub mod pipeline;
pub mod service;
pub mod session;
pub mod vault;

pub use service::{DocQa, ServiceError, ServiceOptions, Upload};
pub use session::{Session, SessionStore};
