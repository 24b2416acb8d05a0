//! Picks the order symbols get documented in.
//!
//! The policy is leaves first: among undocumented symbols, take the
//! one with the fewest outgoing calls, breaking ties by symbol id so
//! runs are reproducible. Fan-out is static, so cycles cannot starve
//! the queue; the pass always drains.

use rusqlite::OptionalExtension;

use crate::error::StoreError;
use crate::model::{CalleeContext, GeneratedDoc, SymbolContext};
use crate::store::GraphStore;

/// One schedulable symbol with its outgoing fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub symbol_id: i64,
    pub calls: i64,
}

pub struct DocScheduler<'a> {
    store: &'a GraphStore,
}

impl<'a> DocScheduler<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// The next symbol to document, or `None` once everything is done.
    pub fn next_candidate(&self) -> Result<Option<Candidate>, StoreError> {
        self.store
            .conn
            .query_row(
                "SELECT symbol_id, calls FROM next_symbol_to_document",
                [],
                |row| {
                    Ok(Candidate {
                        symbol_id: row.get(0)?,
                        calls: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Smallest fan-out among undocumented symbols.
    pub fn min_fanout(&self) -> Result<Option<i64>, StoreError> {
        self.store
            .conn
            .query_row("SELECT calls FROM min_undocumented_call_count", [], |row| {
                row.get(0)
            })
            .map_err(Into::into)
    }

    /// The complete visit order for one generation pass. Because the
    /// counts are static, this equals the sequence repeated
    /// [`next_candidate`](Self::next_candidate) calls would produce.
    pub fn generation_order(&self) -> Result<Vec<Candidate>, StoreError> {
        let mut stmt = self.store.conn.prepare(
            "SELECT symbol_id, calls FROM undocumented_call_counts
             ORDER BY calls ASC, symbol_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Candidate {
                symbol_id: row.get(0)?,
                calls: row.get(1)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn remaining(&self) -> Result<u64, StoreError> {
        self.store
            .conn
            .query_row("SELECT COUNT(*) FROM undocumented_call_counts", [], |row| {
                row.get(0)
            })
            .map_err(Into::into)
    }

    /// Assembles what a generator needs for one symbol: the row, its
    /// file path, the enclosing symbol, and summaries of everything it
    /// calls.
    pub fn context(&self, symbol_id: i64) -> Result<SymbolContext, StoreError> {
        let symbol = self.store.symbol(symbol_id)?;
        let (file_path, parent_name, callees_json): (String, Option<String>, Option<String>) =
            self.store.conn.query_row(
                "SELECT rel_path, parent_name, callees_json
                 FROM symbol_context WHERE symbol_id = ?1",
                [symbol_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
        let callees: Vec<CalleeContext> = match callees_json {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        Ok(SymbolContext {
            symbol,
            file_path,
            parent_name,
            callees,
        })
    }

    pub fn mark_documented(&self, symbol_id: i64, doc: &GeneratedDoc) -> Result<(), StoreError> {
        self.store.set_documented(symbol_id, doc)
    }
}
