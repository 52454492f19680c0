//! # docchat
//!
//! A terminal client for a document question-answering service.
//!
//! The backend stores uploaded documents, extracts their text, retrieves
//! relevant passages, and calls a language model. This crate is the client
//! side: it keeps a persistent chat transcript, caches the backend's document
//! and group listings, and turns user intents into REST calls.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────────────────────────────────────┐
//! │  CLI/view  │──▶│ App                                        │
//! │ (docchat)  │   │  SessionStore        RegistryClient        │
//! └────────────┘   │  CredentialManager   ConversationController│
//!                  └──────┬─────────────────────┬───────────────┘
//!                         ▼                     ▼
//!                 ┌───────────────┐     ┌──────────────┐
//!                 │PersistencePort│     │   Backend    │
//!                 │ (JSON files)  │     │ (HTTP/REST)  │
//!                 └───────────────┘     └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Transport / application / validation errors |
//! | [`models`] | Transcript, document, and wire types |
//! | [`backend`] | Backend trait and HTTP implementation |
//! | [`storage`] | Durable key-value persistence |
//! | [`session`] | Chat transcript store |
//! | [`registry`] | Document and group cache with mutations |
//! | [`credential`] | API key test/save |
//! | [`conversation`] | Question/answer state machine |
//! | [`app`] | Composition of the above |
//! | [`view`] | Text rendering |

pub mod app;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod models;
pub mod registry;
pub mod session;
pub mod storage;
pub mod view;
