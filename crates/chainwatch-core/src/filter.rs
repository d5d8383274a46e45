//! Pre-fetch queries and post-fetch log filters.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::event::{Address, Hash, Log};

/// The filter shipped to the RPC endpoint when fetching or subscribing
/// to event logs.
///
/// Each position in `topics` is OR-matched across its hashes; positions
/// are AND-matched. An empty set at a position matches any value there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub addresses: Vec<Address>,
    pub topics: Vec<Vec<Hash>>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a contract address to filter on.
    #[must_use]
    pub fn address(mut self, addr: Address) -> Self {
        self.addresses.push(addr);
        self
    }

    /// Adds several contract addresses to filter on.
    #[must_use]
    pub fn addresses(mut self, addrs: impl IntoIterator<Item = Address>) -> Self {
        self.addresses.extend(addrs);
        self
    }

    /// Replaces the full positional topic filter.
    #[must_use]
    pub fn topics(mut self, topics: Vec<Vec<Hash>>) -> Self {
        self.topics = topics;
        self
    }

    /// Sets the OR-matched hash set at one topic position, padding earlier
    /// positions with match-any sets as needed.
    #[must_use]
    pub fn topic(mut self, position: usize, hashes: impl IntoIterator<Item = Hash>) -> Self {
        if self.topics.len() <= position {
            self.topics.resize(position + 1, Vec::new());
        }
        self.topics[position] = hashes.into_iter().collect();
        self
    }

    /// Convenience for filtering on the event signature (`topics[0]`).
    #[must_use]
    pub fn event_signature(self, sig: Hash) -> Self {
        self.topic(0, [sig])
    }

    #[must_use]
    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = Some(block);
        self
    }

    #[must_use]
    pub fn to_block(mut self, block: u64) -> Self {
        self.to_block = Some(block);
        self
    }

    #[must_use]
    pub fn block_range(mut self, from: u64, to: u64) -> Self {
        self.from_block = Some(from);
        self.to_block = Some(to);
        self
    }
}

/// A post-fetch log predicate.
///
/// Composites nest arbitrarily: `All` requires every child to match,
/// `Any` requires at least one. An empty composite matches everything
/// (`All`) or nothing (`Any`).
#[derive(Debug, Clone)]
pub enum LogFilter {
    /// Matches logs emitted by any of the given addresses.
    Address(HashSet<Address>),
    /// Matches logs carrying one of the given hashes at a topic position.
    Topic { position: usize, hashes: HashSet<Hash> },
    /// Matches logs within an inclusive block range; `None` is unbounded.
    BlockRange { from: Option<u64>, to: Option<u64> },
    /// AND composition.
    All(Vec<LogFilter>),
    /// OR composition.
    Any(Vec<LogFilter>),
}

impl LogFilter {
    pub fn address(addrs: impl IntoIterator<Item = Address>) -> Self {
        LogFilter::Address(addrs.into_iter().collect())
    }

    pub fn topic(position: usize, hashes: impl IntoIterator<Item = Hash>) -> Self {
        LogFilter::Topic {
            position,
            hashes: hashes.into_iter().collect(),
        }
    }

    pub fn block_range(from: Option<u64>, to: Option<u64>) -> Self {
        LogFilter::BlockRange { from, to }
    }

    pub fn all(filters: impl IntoIterator<Item = LogFilter>) -> Self {
        LogFilter::All(filters.into_iter().collect())
    }

    pub fn any(filters: impl IntoIterator<Item = LogFilter>) -> Self {
        LogFilter::Any(filters.into_iter().collect())
    }

    /// Applies the predicate to a log.
    pub fn matches(&self, log: &Log) -> bool {
        match self {
            LogFilter::Address(addrs) => addrs.contains(&log.address),
            LogFilter::Topic { position, hashes } => log
                .topics
                .get(*position)
                .is_some_and(|t| hashes.contains(t)),
            LogFilter::BlockRange { from, to } => {
                if from.is_some_and(|f| log.block_number < f) {
                    return false;
                }
                !to.is_some_and(|t| log.block_number > t)
            }
            LogFilter::All(filters) => filters.iter().all(|f| f.matches(log)),
            LogFilter::Any(filters) => filters.iter().any(|f| f.matches(log)),
        }
    }
}
