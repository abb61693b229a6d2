//! Document store for chat exchanges and journal entries
//!
//! Records are JSON documents in two `sled` trees (collections), keyed by a
//! monotonic ULID so that key order is creation order. Appends are single
//! insert-if-absent writes followed by a flush; listings walk the key space
//! backwards to produce newest-first results.

use crate::config::StorageConfig;
use crate::error::{MindwellError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use ulid::{Generator, Ulid};

pub mod types;
pub use types::{
    ChatContext, ChatExchange, ExchangeFilter, JournalEntry, JournalFilter, NewChatExchange,
    NewJournalEntry,
};

/// Collection holding chat exchanges
pub const EXCHANGES_COLLECTION: &str = "chat_exchanges";
/// Collection holding journal entries
pub const JOURNAL_COLLECTION: &str = "journal_entries";

/// Where the store lives, parsed from a connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Temporary store removed when the last handle drops
    Memory,
    /// On-disk store directory
    Path(PathBuf),
}

impl StoreLocation {
    /// Parse a connection string
    ///
    /// Accepts `memory:`, `memory://`, `sled://<path>` and plain paths.
    ///
    /// # Examples
    ///
    /// ```
    /// use mindwell::storage::StoreLocation;
    /// use std::path::PathBuf;
    ///
    /// assert_eq!(StoreLocation::parse("memory:").unwrap(), StoreLocation::Memory);
    /// assert_eq!(
    ///     StoreLocation::parse("sled:///var/lib/mindwell").unwrap(),
    ///     StoreLocation::Path(PathBuf::from("/var/lib/mindwell"))
    /// );
    /// ```
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url == "memory:" || url == "memory://" {
            return Ok(Self::Memory);
        }
        if let Some(path) = url.strip_prefix("sled://") {
            if path.is_empty() {
                return Err(MindwellError::Config("sled:// URL has no path".to_string()).into());
            }
            return Ok(Self::Path(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = url.split_once("://") {
            return Err(MindwellError::Config(format!(
                "Unsupported database URL scheme: {}",
                scheme
            ))
            .into());
        }
        if url.is_empty() {
            return Err(MindwellError::Config("database URL cannot be empty".to_string()).into());
        }
        Ok(Self::Path(PathBuf::from(url)))
    }
}

/// Result caps applied to listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    pub default: usize,
    pub max: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            default: 50,
            max: 500,
        }
    }
}

impl From<&StorageConfig> for ListLimits {
    fn from(config: &StorageConfig) -> Self {
        Self {
            default: config.default_list_limit,
            max: config.max_list_limit,
        }
    }
}

impl ListLimits {
    /// The cap to use for a listing
    ///
    /// # Errors
    ///
    /// Returns `MindwellError::Validation` on `limit` if the requested cap is
    /// zero or above the maximum
    pub fn resolve(&self, requested: Option<usize>) -> Result<usize> {
        match requested {
            None => Ok(self.default),
            Some(limit) if limit == 0 || limit > self.max => Err(MindwellError::invalid(
                "limit",
                format!("must be between 1 and {}", self.max),
            )
            .into()),
            Some(limit) => Ok(limit),
        }
    }
}

/// Shared handle to the document store
///
/// Cheap to clone; every clone shares the same underlying database, so the
/// process opens it once and hands clones to whoever needs it.
#[derive(Clone)]
pub struct ConversationStore {
    db: sled::Db,
    exchanges: sled::Tree,
    journal: sled::Tree,
    ids: Arc<Mutex<Generator>>,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("exchanges", &self.exchanges.len())
            .field("journal", &self.journal.len())
            .finish()
    }
}

impl ConversationStore {
    /// Open the store named by `config.database_url`
    ///
    /// # Errors
    ///
    /// Returns `MindwellError::Config` if the URL is missing or malformed and
    /// `MindwellError::Storage` if the database cannot be opened
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let url = config.database_url.as_deref().ok_or_else(|| {
            MindwellError::Config("storage.database_url is required".to_string())
        })?;
        let location = StoreLocation::parse(url)?;

        let mut sled_config = sled::Config::new()
            .cache_capacity(config.cache_capacity_bytes)
            .flush_every_ms(Some(config.flush_every_ms));
        sled_config = match &location {
            StoreLocation::Memory => sled_config.temporary(true),
            StoreLocation::Path(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            MindwellError::Storage(format!(
                                "Failed to create parent directory for database: {}",
                                e
                            ))
                        })?;
                    }
                }
                sled_config.path(path)
            }
        };

        let db = sled_config
            .open()
            .map_err(|e| MindwellError::Storage(format!("Failed to open database: {}", e)))?;
        tracing::info!(location = ?location, "Opened document store");
        Self::from_db(db)
    }

    /// Open a throwaway store, mostly useful in tests
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| MindwellError::Storage(format!("Failed to open database: {}", e)))?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        let exchanges = db
            .open_tree(EXCHANGES_COLLECTION)
            .map_err(|e| MindwellError::Storage(format!("Failed to open collection: {}", e)))?;
        let journal = db
            .open_tree(JOURNAL_COLLECTION)
            .map_err(|e| MindwellError::Storage(format!("Failed to open collection: {}", e)))?;
        Ok(Self {
            db,
            exchanges,
            journal,
            ids: Arc::new(Mutex::new(Generator::new())),
        })
    }

    /// Allocate the next id; ids never go backwards within this process
    fn next_id(&self) -> Result<Ulid> {
        let mut generator = self
            .ids
            .lock()
            .map_err(|_| MindwellError::Storage("id generator lock poisoned".to_string()))?;
        generator
            .generate()
            .map_err(|e| MindwellError::Storage(format!("Failed to allocate id: {}", e)).into())
    }

    /// Persist a chat exchange, assigning its id and timestamp
    ///
    /// # Errors
    ///
    /// Returns `MindwellError::Storage` if the write or flush fails
    pub async fn append_exchange(&self, input: NewChatExchange) -> Result<ChatExchange> {
        let id = self.next_id()?;
        let exchange = ChatExchange {
            id: id.to_string(),
            user_id: input.user_id,
            message: input.message,
            response: input.response,
            timestamp: id_timestamp(id),
            context: input.context.filter(|c| !c.is_empty()),
            sentiment: 0.0,
            category: input.category,
            source: input.source,
        };

        insert_document(&self.exchanges, &exchange.id, &exchange).await?;
        tracing::debug!(id = %exchange.id, category = %exchange.category, "Stored chat exchange");
        Ok(exchange)
    }

    /// Newest-first chat exchanges matching `filter`, at most `limit` of them
    pub fn list_exchanges(
        &self,
        limit: usize,
        filter: &ExchangeFilter,
    ) -> Result<Vec<ChatExchange>> {
        collect_newest_first(self.exchanges.iter().rev(), limit, |e| filter.matches(e))
    }

    /// Persist a validated journal entry, assigning its id and timestamp
    ///
    /// # Errors
    ///
    /// Returns `MindwellError::Storage` if the write or flush fails
    pub async fn append_journal_entry(&self, input: NewJournalEntry) -> Result<JournalEntry> {
        let id = self.next_id()?;
        let entry = JournalEntry {
            id: id.to_string(),
            user_id: input.user_id,
            content: input.content,
            mood: input.mood,
            tags: input.tags,
            activities: input.activities,
            timestamp: id_timestamp(id),
            sentiment: 0.0,
        };

        insert_document(&self.journal, &entry.id, &entry).await?;
        tracing::debug!(id = %entry.id, mood = entry.mood, "Stored journal entry");
        Ok(entry)
    }

    /// Newest-first journal entries matching `filter`
    ///
    /// Date bounds narrow the key range scanned; the filter itself remains
    /// the authority on which entries qualify.
    pub fn list_journal_entries(
        &self,
        filter: &JournalFilter,
        limit: Option<usize>,
    ) -> Result<Vec<JournalEntry>> {
        let lower = match filter.start {
            Some(start) => Bound::Included(Ulid::from_parts(millis(start), 0).to_string()),
            None => Bound::Unbounded,
        };
        let upper = match filter.end {
            Some(end) => Bound::Included(Ulid::from_parts(millis(end), u128::MAX).to_string()),
            None => Bound::Unbounded,
        };
        collect_newest_first(
            self.journal.range((lower, upper)).rev(),
            limit.unwrap_or(usize::MAX),
            |e| filter.matches(e),
        )
    }

    /// Number of stored chat exchanges
    pub fn exchange_count(&self) -> usize {
        self.exchanges.len()
    }

    /// Number of stored journal entries
    pub fn journal_count(&self) -> usize {
        self.journal.len()
    }

    /// Checks the store is reachable
    pub fn ping(&self) -> Result<()> {
        self.db
            .checksum()
            .map(|_| ())
            .map_err(|e| MindwellError::Storage(format!("Store unavailable: {}", e)).into())
    }
}

fn id_timestamp(id: Ulid) -> DateTime<Utc> {
    DateTime::<Utc>::from(id.datetime())
}

fn millis(ts: DateTime<Utc>) -> u64 {
    u64::try_from(ts.timestamp_millis()).unwrap_or(0)
}

async fn insert_document<T: serde::Serialize>(
    tree: &sled::Tree,
    key: &str,
    doc: &T,
) -> Result<()> {
    let value = serde_json::to_vec(doc)
        .map_err(|e| MindwellError::Storage(format!("Serialization failed: {}", e)))?;

    tree.compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(value))
        .map_err(|e| MindwellError::Storage(format!("Insert failed: {}", e)))?
        .map_err(|_| MindwellError::Storage(format!("Document {} already exists", key)))?;

    tree.flush_async()
        .await
        .map_err(|e| MindwellError::Storage(format!("Flush failed: {}", e)))?;

    Ok(())
}

fn collect_newest_first<T, I, F>(iter: I, limit: usize, keep: F) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    I: Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
    F: Fn(&T) -> bool,
{
    let mut records = Vec::new();
    for result in iter {
        if records.len() >= limit {
            break;
        }
        let (_, value) =
            result.map_err(|e| MindwellError::Storage(format!("Iteration failed: {}", e)))?;
        let record: T = serde_json::from_slice(&value)
            .map_err(|e| MindwellError::Storage(format!("Deserialization failed: {}", e)))?;
        if keep(&record) {
            records.push(record);
        }
    }
    Ok(records)
}
