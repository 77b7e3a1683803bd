//! # RAG Console
//!
//! Typed client and operation lifecycle for a retrieval-augmented-generation
//! backend: submit documents for ingestion, ask questions against the
//! ingested corpus, pick the answering model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Front end   │──▶│  Operation   │──▶│  ApiClient   │──▶ backend
//! │ (CLI / view) │   │ idle→pending │   │ guards +     │
//! │              │◀──│ →settled     │◀──│ interceptor  │
//! └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Every failure reaching a front end is a [`error::ClassifiedError`];
//! every success is a value whose payload passed a shape guard. Repeated
//! submissions of the same action never let an older response overwrite a
//! newer one.
//!
//! ## Quick Start
//!
//! ```bash
//! ragc health
//! ragc add https://example.com/guide --category code
//! ragc ask "How do I configure the index?" --model llama-3.2-1b
//! ragc stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Request/response contracts |
//! | [`guards`] | Payload shape guards |
//! | [`error`] | Classified error taxonomy |
//! | [`interceptor`] | Response/error classification pipeline |
//! | [`client`] | HTTP adapter and the [`client::RagApi`] trait |
//! | [`operation`] | Per-action state machine with stale-result suppression |
//! | [`console`] | Front-end facade bundling the client and operations |

pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod guards;
pub mod interceptor;
pub mod models;
pub mod operation;
