// src/models/mod.rs

//! Domain models for the posting bot.

mod config;
mod failure;
mod posting;
mod source;

// Re-export all public types
pub use config::{Config, CrawlerConfig, DeliveryConfig, PathsConfig, TelegramConfig};
pub use failure::{ChannelResponse, FailureRecord, MAX_BODY_CHARS};
pub use posting::Posting;
pub use source::{SourceConfig, SourceKind};
