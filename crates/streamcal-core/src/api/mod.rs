//! HTTP clients for the services the calendar reads from.
//!
//! - `StoreApi` / `StoreClient`: the remote relational store (members,
//!   schedules, D-Days, notices), spoken to over a PostgREST-style REST API
//! - `MediaApi` / `MediaClient`: the clip/VOD and video provider endpoints,
//!   keyed by channel id
//!
//! The traits are the seam the fetchers and the schedule service depend
//! on, so tests can substitute in-memory fakes.

pub mod client;
pub mod error;
pub mod media;
pub mod store;

pub use client::HttpClient;
pub use error::ApiError;
pub use media::{ChannelItems, MediaApi, MediaClient};
pub use store::{StoreApi, StoreClient};
