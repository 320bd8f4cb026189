//! In-memory record set shared by the storage backends.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Posting;

/// Ordered posting records plus the next sequence number.
///
/// `postings` is always sorted by `seq`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Records {
    #[serde(default = "first_seq")]
    pub next_seq: u64,
    #[serde(default)]
    pub postings: Vec<Posting>,
}

fn first_seq() -> u64 {
    1
}

impl Default for Records {
    fn default() -> Self {
        Self::new()
    }
}

impl Records {
    pub fn new() -> Self {
        Self {
            next_seq: first_seq(),
            postings: Vec::new(),
        }
    }

    /// Repair records loaded from an older file: assign missing sequence
    /// numbers and restore ordering.
    pub fn normalize_sequences(&mut self) {
        let mut next = self
            .postings
            .iter()
            .map(|p| p.seq)
            .max()
            .unwrap_or(0)
            .max(self.next_seq.saturating_sub(1))
            + 1;
        for posting in self.postings.iter_mut().filter(|p| p.seq == 0) {
            posting.seq = next;
            next += 1;
        }
        self.postings.sort_by_key(|p| p.seq);
        self.next_seq = next;
    }

    pub fn get(&self, id: &str) -> Option<&Posting> {
        self.postings.iter().find(|p| p.id == id)
    }

    pub fn insert_if_absent(&mut self, mut posting: Posting) -> bool {
        if self.get(&posting.id).is_some() {
            return false;
        }
        posting.seq = self.next_seq;
        self.next_seq += 1;
        self.postings.push(posting);
        true
    }

    pub fn mark_sent(&mut self, id: &str) -> bool {
        match self.postings.iter_mut().find(|p| p.id == id) {
            Some(posting) => {
                posting.sent = true;
                true
            }
            None => false,
        }
    }

    pub fn unsent(&self) -> Vec<Posting> {
        self.postings.iter().filter(|p| !p.sent).cloned().collect()
    }

    pub fn by_ids(&self, ids: &[String]) -> Vec<Posting> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.postings
            .iter()
            .filter(|p| wanted.contains(p.id.as_str()))
            .cloned()
            .collect()
    }

    /// Apply a batch of record replacements, or nothing.
    pub fn apply(&mut self, updates: Vec<Posting>) -> Result<()> {
        let index_by_seq: HashMap<u64, usize> = self
            .postings
            .iter()
            .enumerate()
            .map(|(i, p)| (p.seq, i))
            .collect();

        let mut pending: HashMap<u64, Posting> = HashMap::with_capacity(updates.len());
        for update in updates {
            if !index_by_seq.contains_key(&update.seq) {
                return Err(AppError::NotFound(update.seq));
            }
            pending.insert(update.seq, update);
        }

        let mut seen = HashSet::with_capacity(self.postings.len());
        for posting in &self.postings {
            let id = pending.get(&posting.seq).map_or(&posting.id, |u| &u.id);
            if !seen.insert(id.as_str()) {
                return Err(AppError::id_conflict(id.clone()));
            }
        }

        for (seq, update) in pending {
            self.postings[index_by_seq[&seq]] = update;
        }
        Ok(())
    }
}
