//! Core library for streamcal.
//!
//! This crate holds everything behind the schedule site's calendar that is
//! not presentation: data models, the in-memory cache, cached fetchers for
//! the remote store and the media providers, the schedule conflict
//! resolver and the observable weekly/daily view store.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod schedule;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
