// src/lib.rs

//! Posting Bot Library
//!
//! Scrapes real-estate listing sites, stores each listing once under a
//! URL-derived id, and delivers new listings to a Telegram chat.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
