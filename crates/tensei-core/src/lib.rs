//! Core types and trait definitions for the Tensei live-stream notifier.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every other crate depends on it: the storage backend, the Twitch status
//! source, the Discord gateway and the monitoring engine all speak in terms
//! of the types and traits defined here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod card;
pub mod cooldown;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod humanize;
pub mod ratelimit;
pub mod source;
pub mod store;
pub mod transition;

pub use error::{DeliveryError, Error, Result, SourceError};
pub use humanize::humanize_duration;
