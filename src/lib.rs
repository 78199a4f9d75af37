//! Grounded retrieval for interview prep — a rebuildable semantic passage index.
//!
//! Primer turns a growing, mutable document collection into a searchable
//! vector index and keeps the two in sync. The collection has two halves: a
//! static base corpus carried forward between rebuilds, and interview
//! documents managed in a flat JSON store. Any change to either half takes
//! effect through a full index rebuild; queries run against the last
//! persisted index until then.
//!
//! # Architecture
//!
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 (384
//!   dimensions), or an OpenAI-compatible `/embeddings` endpoint
//! - **Index**: flat exhaustive squared-L2 search over L2-normalized
//!   vectors, persisted as JSON alongside position-aligned metadata
//! - **Rebuild**: full regeneration with timestamped backups, atomic file
//!   replacement, live progress reporting, and an on-disk status record
//! - **Retrieval**: a load-once handle answering top-k passage queries,
//!   refreshed only by an explicit reload
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`corpus`] — Document model and corpus assembly from both document origins
//! - [`embedding`] — Text-to-vector embedding pipeline
//! - [`error`] — Typed error taxonomy for the retrieval core
//! - [`index`] — The persisted vector index and its metadata record
//! - [`interviews`] — The interview document store collaborator
//! - [`rebuild`] — Rebuild orchestration, progress, and status records
//! - [`retriever`] — Load-once query handle

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod index;
pub mod interviews;
pub mod rebuild;
pub mod retriever;
