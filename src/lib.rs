//! Mort - Mortgage Q&A
//!
//! A CLI and HTTP API that answers mortgage questions from a
//! retrieval-augmented knowledge base.
//!
//! # Overview
//!
//! Mort allows you to:
//! - Ask a question and get an answer generated from retrieved chunks
//! - See the sources of an answer grouped per resource, with the times
//!   within each source where the material appears
//! - Serve the same over HTTP for other systems
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration, secrets and prompt templates
//! - `embedding` - Query embeddings
//! - `retrieval` - Similarity search against the index
//! - `completion` - Answer generation
//! - `aggregate` - Grouping of retrieved chunks into displayable sources
//! - `retry` - Bounded retries for external calls
//! - `rag` - Question answering engine
//! - `orchestrator` - Service wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use mort::config::{Secrets, Settings};
//! use mort::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let secrets = Secrets::resolve(&settings)?;
//!     let orchestrator = Orchestrator::connect(settings, secrets).await?;
//!
//!     let response = orchestrator.engine(None).ask("What is an escrow account?").await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod cli;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retrieval;
pub mod retry;

pub use error::{MortError, Result};
