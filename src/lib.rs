//! # rustspringer
//!
//! Publications per country from the Springer Nature metadata API, broken
//! down by year, topic and journal.
//!
//! ## Modules
//!
//! - [`metadata`] - Springer metadata API client and country facet extraction
//! - [`query`] - Query strings and publication column names
//! - [`table`] - Per-year country frames and the cross-year publications table
//! - [`aggregate`] - Years × topics × journals aggregation
//! - [`plot`] - Country comparison line charts
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustspringer::aggregate::{top_countries, DelayPolicy, Selection};
//! use rustspringer::metadata::{ClientConfig, SpringerClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SpringerClient::new(ClientConfig::new("my-api-key"))?;
//!     let selection = Selection::new((2010..=2020).collect())
//!         .with_topics(["oncology"])
//!         .with_journals(["Nature"]);
//!     let table = top_countries(&client, &selection, DelayPolicy::default()).await?;
//!     println!("{} rows", table.len());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod error;
pub mod metadata;
pub mod plot;
pub mod query;
pub mod table;

pub use error::{Result, SpringerError};
