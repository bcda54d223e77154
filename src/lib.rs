//! # Source Shelf
//!
//! A local-first source library and context assembly layer for chat
//! assistants.
//!
//! Source Shelf accumulates reference sources (remote URLs and uploaded PDF
//! documents), organizes them into named groups, persists them durably, and
//! assembles the active group's content into the context payload sent to a
//! generation backend on every chat turn.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────┐
//! │ LibraryManager│───▶│ Metadata Store │     │  Blob Store  │
//! │  (mutations)  │    │ (JSON document)│     │   (SQLite)   │
//! └──────┬───────┘     └───────────────┘     └──────┬───────┘
//!        │                     ▲                    │
//!        │     startup ┌───────┴───────┐            │
//!        │             │  Reconciler   │◀───────────┤
//!        ▼             └───────────────┘            │
//! ┌──────────────┐                                  │
//! │   Context    │◀─────────────────────────────────┘
//! │  Assembler   │───▶ generation backend (per chat turn)
//! └──────────────┘
//! ```
//!
//! Descriptors (lightweight, no payload) live in the metadata document;
//! full records (base64 payload included) live in the blob store under the
//! same id. The two stores fail independently; the reconciler repairs
//! orphaned blobs at startup and context assembly tolerates dangling
//! descriptors at read time.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`store`] | Blob store trait, SQLite and in-memory backends |
//! | [`metadata`] | Single-document JSON metadata store |
//! | [`reconcile`] | Startup reconciliation between the two stores |
//! | [`library`] | Mutation surface for the group list |
//! | [`context`] | Per-turn context assembly |
//! | [`generation`] | Generation-backend client |
//! | [`chat`] | Chat-turn orchestration |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chat;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod generation;
pub mod library;
pub mod metadata;
pub mod migrate;
pub mod models;
pub mod reconcile;
pub mod store;
