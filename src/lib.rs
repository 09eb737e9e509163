//! # asKNOU
//!
//! Terminal client for the asKNOU academic information chatbot of the Korea
//! National Open University.
//!
//! The backend answers questions with retrieval-augmented generation over
//! uploaded PDF documents. This crate is the client side: a chat panel for
//! the public, a PDF upload form, and an admin console for the document
//! store, all driven through one async API seam.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  ┌────────────┐  ┌──────────────┐
//! │ ChatPanel │  │ UploadForm │  │ AdminConsole │◀── AuthContext
//! └─────┬─────┘  └─────┬──────┘  └──────┬───────┘     (login gate)
//!       └──────────────┼────────────────┘
//!                      ▼
//!                 dyn RagApi
//!                      │
//!                      ▼
//!              ┌──────────────┐        ┌─────────────────┐
//!              │  ApiClient   │──HTTP─▶│ FastAPI backend │
//!              └──────────────┘        └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! asknou health
//! asknou ask "수강신청 일정이 언제인가요?"
//! asknou chat
//! asknou admin login --id admin
//! asknou admin upload ./2024-학사일정.pdf
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`logging`] | Diagnostic log sink |
//! | [`error`] | Transport and server error taxonomy |
//! | [`models`] | Wire types for every backend endpoint |
//! | [`traits`] | The `RagApi` seam |
//! | [`client`] | HTTP implementation of `RagApi` |
//! | [`chat`] | Chat panel and messages |
//! | [`upload`] | PDF validation gate and upload form |
//! | [`progress`] | Upload progress reporting |
//! | [`admin`] | Admin console state |
//! | [`session`] | Admin login gate |
//! | [`render`] | Terminal rendering |

pub mod admin;
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod progress;
pub mod render;
pub mod session;
pub mod traits;
pub mod upload;

#[cfg(test)]
mod fake_api;
