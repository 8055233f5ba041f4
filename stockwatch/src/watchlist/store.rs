//! Watchlist store over a key-value backend.
//!
//! # Keys
//! - `watchlist.initialized`: set once the defaults have been seeded
//! - `watchlist.symbols`: JSON array of symbols, in insertion order
//! - `watchlist.name.<SYMBOL>`: display name for one symbol
//!
//! `add` does not de-duplicate; consumers must tolerate repeated symbols.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info};

use stockwatch_common::{Error, Result, ResultExt};

use super::kv::KeyValueStore;
use super::{WatchlistEntry, WatchlistEvent};
use crate::data::Symbol;

const INITIALIZED_KEY: &str = "watchlist.initialized";
const SYMBOLS_KEY: &str = "watchlist.symbols";
const NAME_KEY_PREFIX: &str = "watchlist.name.";

/// Buffered events per subscriber before it lags.
const EVENT_CAPACITY: usize = 64;

fn name_key(symbol: &Symbol) -> String {
    format!("{}{}", NAME_KEY_PREFIX, symbol)
}

/// Persisted symbol → display-name mapping with change notifications.
pub struct WatchlistStore {
    kv: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<WatchlistEvent>,
    /// Serializes read-modify-write of the symbol list
    write_lock: Mutex<()>,
}

impl WatchlistStore {
    /// Open the store, seeding `defaults` on first-ever use.
    pub fn open(kv: Arc<dyn KeyValueStore>, defaults: &BTreeMap<String, String>) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let store = Self {
            kv,
            events,
            write_lock: Mutex::new(()),
        };

        if store.kv.get(INITIALIZED_KEY)?.is_none() {
            store.seed(defaults).context("seeding default watchlist")?;
        }

        Ok(store)
    }

    fn seed(&self, defaults: &BTreeMap<String, String>) -> Result<()> {
        let mut symbols = Vec::with_capacity(defaults.len());
        for (raw, name) in defaults {
            let symbol = Symbol::parse(raw)?;
            self.kv.set(&name_key(&symbol), name)?;
            symbols.push(symbol);
        }
        self.write_symbols(&symbols)?;
        self.kv.set(INITIALIZED_KEY, "true")?;

        info!(count = symbols.len(), "Seeded default watchlist");
        Ok(())
    }

    /// Subscribe to mutation events.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchlistEvent> {
        self.events.subscribe()
    }

    fn read_symbols(&self) -> Result<Vec<Symbol>> {
        match self.kv.get(SYMBOLS_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<Symbol>>(&raw).context("decoding watchlist symbols"),
            None => Ok(Vec::new()),
        }
    }

    fn write_symbols(&self, symbols: &[Symbol]) -> Result<()> {
        let raw = serde_json::to_string(symbols)?;
        self.kv.set(SYMBOLS_KEY, &raw)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::Storage("watchlist write lock poisoned".into()))
    }

    /// All entries in insertion order. Duplicates are returned as stored.
    ///
    /// A missing display name falls back to the symbol itself.
    pub fn list_symbols(&self) -> Result<Vec<WatchlistEntry>> {
        self.read_symbols()?
            .into_iter()
            .map(|symbol| {
                let display_name = self
                    .kv
                    .get(&name_key(&symbol))?
                    .unwrap_or_else(|| symbol.to_string());
                Ok(WatchlistEntry {
                    symbol,
                    display_name,
                })
            })
            .collect()
    }

    pub fn contains(&self, symbol: &Symbol) -> Result<bool> {
        Ok(self.read_symbols()?.contains(symbol))
    }

    pub fn display_name(&self, symbol: &Symbol) -> Result<Option<String>> {
        self.kv.get(&name_key(symbol))
    }

    /// Append a symbol and notify subscribers.
    pub fn add(&self, symbol: &Symbol, display_name: &str) -> Result<()> {
        {
            let _guard = self.lock()?;
            let mut symbols = self.read_symbols()?;
            symbols.push(symbol.clone());
            self.kv.set(&name_key(symbol), display_name)?;
            self.write_symbols(&symbols)
                .context(format!("adding {}", symbol))?;
        }

        debug!(symbol = %symbol, "Added to watchlist");
        // No subscribers is fine
        let _ = self.events.send(WatchlistEvent::Added {
            symbol: symbol.clone(),
        });
        Ok(())
    }

    /// Remove every occurrence of a symbol and notify subscribers.
    pub fn remove(&self, symbol: &Symbol) -> Result<()> {
        {
            let _guard = self.lock()?;
            let mut symbols = self.read_symbols()?;
            let before = symbols.len();
            symbols.retain(|s| s != symbol);
            if symbols.len() == before {
                return Err(Error::NotFound(format!("{} is not on the watchlist", symbol)));
            }
            self.write_symbols(&symbols)?;
            self.kv.remove(&name_key(symbol))?;
        }

        debug!(symbol = %symbol, "Removed from watchlist");
        let _ = self.events.send(WatchlistEvent::Removed {
            symbol: symbol.clone(),
        });
        Ok(())
    }
}
