//! # lineup-api
//!
//! HTTP transport for the lineup backend: a `reqwest`-based client
//! implementing [`lineup_core::LineupTransport`] over the REST endpoints.
//! Session credentials travel implicitly in the cookie store.

pub mod client;
pub mod dto;

pub use client::{HttpTransport, HttpTransportError};
pub use dto::{ApiErrorBody, MemoRequest, UpdateGbsNumberRequest};
