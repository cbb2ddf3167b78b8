//! # DocChat client
//!
//! A terminal client for the DocChat document-chat service: sign up, upload
//! a PDF, tune retrieval parameters, and converse with an assistant scoped
//! to that document. Everything heavy — chunking, embedding, vector search,
//! generation — happens server-side; this crate is the thin, typed edge.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────────┐
//! │   CLI    │──▶│ Registry/Chat │──▶│  ApiClient    │──▶ DocChat backend
//! │  (dc)    │   │  (in-memory)  │   │ REST + NDJSON │
//! └──────────┘   └───────────────┘   └──────────────┘
//!                        │
//!                        ▼
//!                ┌──────────────┐
//!                │   Session    │  (bearer token on disk)
//!                └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! dc signup alice                       # create an account and sign in
//! dc assistants create paper.pdf --name paper
//! dc ask 1 "What does section 3 claim?"
//! dc chat                               # interactive session
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Wire and message-log data types |
//! | [`session`] | Persisted bearer token + username |
//! | [`client`] | HTTP wrapper with the typed error taxonomy |
//! | [`create`] | Streamed assistant creation (NDJSON progress feed) |
//! | [`progress`] | Creation progress reporting on stderr |
//! | [`registry`] | Cached assistant list + selection state |
//! | [`chat`] | Per-assistant in-memory message log |
//! | [`auth`] | signup/login/logout/whoami commands |
//! | [`assistants_cmd`] | list/create/delete commands |
//! | [`chat_cmd`] | `ask` and the interactive chat loop |
//! | [`admin`] | elevated-role management commands |

pub mod admin;
pub mod assistants_cmd;
pub mod auth;
pub mod chat;
pub mod chat_cmd;
pub mod client;
pub mod config;
pub mod create;
pub mod models;
pub mod progress;
pub mod registry;
pub mod session;
