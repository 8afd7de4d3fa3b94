//! Distribution store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the active distribution as per-agent lists with ordered items.
//! - Replace the whole distribution in one transaction.
//!
//! # Invariants
//! - At most one distribution is stored; `replace_lists` never merges.
//! - `replace_lists` is all-or-nothing: on any error the previous
//!   distribution is left untouched.
//! - `replace_lists` runs in an IMMEDIATE transaction, so concurrent
//!   replacements are serialized by the SQLite write lock.
//! - Lists are read back ordered by `assigned_at DESC, position ASC`.

use crate::model::agent::AgentId;
use crate::model::assigned_list::{AssignedList, ListDraft};
use crate::model::contact::ContactRecord;
use crate::repo::{
    ensure_connection_ready, now_epoch_ms, parse_uuid, RepoError, RepoResult, RequiredTable,
};
use log::{error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::time::Instant;
use uuid::Uuid;

const LIST_SELECT_SQL: &str = "SELECT
    id,
    agent_id,
    agent_name,
    position,
    assigned_at
FROM assigned_lists";

const LIST_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "assigned_lists",
        columns: &["id", "agent_id", "agent_name", "position", "assigned_at"],
    },
    RequiredTable {
        name: "list_items",
        columns: &["list_id", "position", "first_name", "phone", "notes"],
    },
];

/// Repository interface for the distribution store.
pub trait ListRepository {
    /// Atomically discards the stored distribution and persists `drafts`.
    ///
    /// Every list is stamped with the same assignment time; list order
    /// follows `drafts` order.
    fn replace_lists(&self, drafts: &[ListDraft]) -> RepoResult<Vec<AssignedList>>;
    /// Lists of the stored distribution, most recent first.
    fn list_lists(&self) -> RepoResult<Vec<AssignedList>>;
    /// The stored list for one agent, if any.
    fn get_list_for_agent(&self, agent_id: AgentId) -> RepoResult<Option<AssignedList>>;
    /// Total number of items across stored lists.
    fn count_items(&self) -> RepoResult<u64>;
}

/// SQLite-backed distribution store.
pub struct SqliteListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, LIST_TABLES)?;
        Ok(Self { conn })
    }
}

impl ListRepository for SqliteListRepository<'_> {
    fn replace_lists(&self, drafts: &[ListDraft]) -> RepoResult<Vec<AssignedList>> {
        let started_at = Instant::now();
        let item_count: usize = drafts.iter().map(|draft| draft.items.len()).sum();

        match replace_in_tx(self.conn, drafts) {
            Ok(lists) => {
                info!(
                    "event=lists_replace module=repo status=ok list_count={} item_count={} duration_ms={}",
                    lists.len(),
                    item_count,
                    started_at.elapsed().as_millis()
                );
                Ok(lists)
            }
            Err(err) => {
                error!(
                    "event=lists_replace module=repo status=error list_count={} item_count={} duration_ms={} error={}",
                    drafts.len(),
                    item_count,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn list_lists(&self) -> RepoResult<Vec<AssignedList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL} ORDER BY assigned_at DESC, position ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(self.conn, row)?);
        }

        Ok(lists)
    }

    fn get_list_for_agent(&self, agent_id: AgentId) -> RepoResult<Option<AssignedList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             WHERE agent_id = ?1
             ORDER BY assigned_at DESC, position ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([agent_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn count_items(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM list_items;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative item count `{count}`")))
    }
}

fn replace_in_tx(conn: &Connection, drafts: &[ListDraft]) -> RepoResult<Vec<AssignedList>> {
    // Dropping `tx` without commit rolls back.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute("DELETE FROM list_items;", [])?;
    tx.execute("DELETE FROM assigned_lists;", [])?;

    let assigned_at = now_epoch_ms();
    let mut lists = Vec::with_capacity(drafts.len());
    for (position, draft) in drafts.iter().enumerate() {
        let position = u32::try_from(position)
            .map_err(|_| RepoError::InvalidData("too many lists in one distribution".into()))?;
        lists.push(insert_list(&tx, draft, position, assigned_at)?);
    }

    tx.commit()?;
    Ok(lists)
}

fn insert_list(
    tx: &Transaction<'_>,
    draft: &ListDraft,
    position: u32,
    assigned_at: i64,
) -> RepoResult<AssignedList> {
    let list_id = Uuid::new_v4();
    let list_id_text = list_id.to_string();
    tx.execute(
        "INSERT INTO assigned_lists (
            id,
            agent_id,
            agent_name,
            position,
            assigned_at
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            list_id_text.as_str(),
            draft.agent_id.to_string(),
            draft.agent_name.as_str(),
            position,
            assigned_at,
        ],
    )?;

    let mut insert_item = tx.prepare_cached(
        "INSERT INTO list_items (
            list_id,
            position,
            first_name,
            phone,
            notes
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
    )?;
    for (item_position, item) in draft.items.iter().enumerate() {
        insert_item.execute(params![
            list_id_text.as_str(),
            item_position as i64,
            item.first_name.as_str(),
            item.phone.as_str(),
            item.notes.as_str(),
        ])?;
    }

    Ok(AssignedList {
        id: list_id,
        agent_id: draft.agent_id,
        agent_name: draft.agent_name.clone(),
        position,
        items: draft.items.clone(),
        assigned_at,
    })
}

fn parse_list_row(conn: &Connection, row: &Row<'_>) -> RepoResult<AssignedList> {
    let id_text: String = row.get("id")?;
    let agent_id_text: String = row.get("agent_id")?;
    Ok(AssignedList {
        id: parse_uuid(&id_text, "assigned_lists.id")?,
        agent_id: parse_uuid(&agent_id_text, "assigned_lists.agent_id")?,
        agent_name: row.get("agent_name")?,
        position: row.get("position")?,
        items: load_items(conn, &id_text)?,
        assigned_at: row.get("assigned_at")?,
    })
}

fn load_items(conn: &Connection, list_id: &str) -> RepoResult<Vec<ContactRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT first_name, phone, notes
         FROM list_items
         WHERE list_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([list_id])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(ContactRecord {
            first_name: row.get(0)?,
            phone: row.get(1)?,
            notes: row.get(2)?,
        });
    }
    Ok(items)
}
