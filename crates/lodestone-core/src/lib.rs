//! # Lodestone Core
//!
//! In-memory, low-latency, incremental-substring search for type-ahead
//! UIs. Items carrying an opaque payload are registered with free-form
//! keyword strings; a query matches any contiguous substring of any
//! keyword, so partially typed input surfaces the top hits immediately.
//!
//! Fit for small to medium datasets (thousands to low millions of keyword
//! fragments) that live comfortably in memory. The engine is purely
//! passive and functionally deterministic: identical ingested datasets
//! produce identical results on any host.
//!
//! ## Modules
//!
//! - [`engine`] - [`SearchEngine`] façade: ingestion, queries, top-k
//! - [`graph`] - the fragment graph indexing every keyword substring
//! - [`pipeline`] - extractor/normalizer input pipeline
//! - [`scoring`] - match scorer contract and the default scorer
//! - [`config`] - policies, callback seams, engine configuration
//! - [`types`] - result records and the stats snapshot
//!
//! ## Usage
//!
//! ```
//! use lodestone_core::{AccumulationPolicy, SearchEngine};
//!
//! let engine = SearchEngine::<&str>::builder()
//!     .accumulation_policy(AccumulationPolicy::Intersection)
//!     .build();
//!
//! engine.add_item("Jane Doe, 1234", "Jane Doe Marketing Manager SEO 1234");
//! engine.add_item("Eve Moneypenny, 9223", "Eve Moneypenny Accounting Manager 9223");
//!
//! // Both carry "manager"; only Eve also matches "acc".
//! let hits = engine.find_items("mana acc", 10);
//! assert_eq!(hits, vec!["Eve Moneypenny, 9223"]);
//! ```
//!
//! ## Concurrency
//!
//! A [`SearchEngine`] is `Send + Sync`: readers run concurrently with each
//! other and mutations are exclusive, each operation atomic to observers.
//! With [`EngineConfig::parallel_combine`] set, multi-token queries fan
//! their per-fragment walks out onto the rayon pool.

pub mod config;
pub mod engine;
pub mod graph;
pub mod pipeline;
pub mod scoring;
pub mod types;

// Internal combinators - exposed for benchmarking but hidden from docs.
#[doc(hidden)]
pub mod combine;

pub use config::{AccumulationPolicy, EngineConfig, UnmatchedPolicy};
pub use engine::{SearchEngine, SearchEngineBuilder};
pub use graph::FragmentGraph;
pub use types::{ItemDetail, SearchReport, Stats};
