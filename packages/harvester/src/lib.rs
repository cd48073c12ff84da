//! Dados Abertos Harvester - Mirror the Portuguese Parliament open-data portal.
//!
//! This crate walks the portal's theme pages down to the JSON datasets
//! published per legislature, converts each dataset to CSV and writes it to a
//! local directory, touching a file only when its content changed.
//!
//! # Example
//!
//! ```
//! use dados_abertos_harvester::{convert, safe_filename};
//! use serde_json::json;
//!
//! let csv = convert(&json!([{"id": 1, "autor": {"nome": "Ana"}}])).unwrap();
//! assert_eq!(csv, b"id,autor.nome\n1,Ana\n");
//! assert_eq!(safe_filename("Projetos de Lei").unwrap(), "Projetos_de_Lei");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Theme URLs, timeouts and run settings
//! - [`error`]: Error types and Result alias
//! - [`http`]: Fetching pages and JSON payloads
//! - [`links`]: Link discovery on theme and legislature pages
//! - [`convert`]: JSON flattening and CSV serialization
//! - [`writer`]: Hash-based change detection and atomic writes
//! - [`harvester`]: Orchestration of a full run
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod harvester;
pub mod http;
pub mod links;
pub mod writer;

// Re-export commonly used items
pub use config::HarvestConfig;
pub use convert::{convert, normalize, Table};
pub use error::{HarvesterError, Result};
pub use harvester::{HarvestEvent, Harvester, RunSummary};
pub use http::{Fetcher, HttpFetcher};
pub use links::{extract_json_link, extract_legislature_links, DatasetLink, TitleMatch};
pub use writer::{safe_filename, DatasetReport, DatasetWriter, WriteOutcome};
