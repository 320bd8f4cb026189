//! Service layer for the posting bot.
//!
//! This module contains the business logic for:
//! - Listing extraction per site (`sources`)
//! - Id reconciliation of stored postings (`reconcile`)
//! - Outbound delivery with retries (`delivery`)
//! - The daily backlog summary (`report`)

pub mod delivery;
pub mod reconcile;
pub mod report;
pub mod sources;

pub use delivery::{DeliveryEngine, MessageChannel, ParseMode, RetryPolicy, TelegramChannel};
pub use reconcile::{MergeReport, NormalizeReport, merge_duplicates, normalize_ids};
pub use report::build_report;
pub use sources::{SourceParser, collect_new, parser_for};
