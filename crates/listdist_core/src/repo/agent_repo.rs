//! Agent registry contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/list/delete over the `agents` table.
//! - Enforce email uniqueness at the storage boundary.
//!
//! # Invariants
//! - Write paths call `NewAgent::validate()` before SQL mutations.
//! - Only the credential hash is persisted; it is never read back into
//!   the `Agent` model.
//! - Listing order is registration order.

use crate::model::agent::{normalize_email, Agent, AgentId, NewAgent};
use crate::repo::{
    ensure_connection_ready, now_epoch_ms, parse_uuid, RepoError, RepoResult, RequiredTable,
};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use uuid::Uuid;

const AGENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    phone_number,
    created_at
FROM agents";

const AGENT_TABLES: &[RequiredTable] = &[RequiredTable {
    name: "agents",
    columns: &[
        "id",
        "name",
        "email",
        "phone_number",
        "credential_hash",
        "created_at",
    ],
}];

/// Repository interface for the agent registry.
pub trait AgentRepository {
    /// Inserts a validated agent with an already-hashed credential.
    fn create_agent(&self, agent: &NewAgent, credential_hash: &str) -> RepoResult<Agent>;
    fn get_agent(&self, id: AgentId) -> RepoResult<Option<Agent>>;
    /// Lists all agents in registration order.
    fn list_agents(&self) -> RepoResult<Vec<Agent>>;
    /// Hard-deletes one agent; `NotFound` when the id is unknown.
    fn delete_agent(&self, id: AgentId) -> RepoResult<()>;
}

/// SQLite-backed agent registry.
pub struct SqliteAgentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAgentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, AGENT_TABLES)?;
        Ok(Self { conn })
    }
}

impl AgentRepository for SqliteAgentRepository<'_> {
    fn create_agent(&self, agent: &NewAgent, credential_hash: &str) -> RepoResult<Agent> {
        agent.validate()?;
        let agent = agent.normalized();

        if email_taken(self.conn, &agent.email)? {
            return Err(RepoError::DuplicateEmail(agent.email));
        }

        let created = Agent {
            id: Uuid::new_v4(),
            name: agent.name,
            email: agent.email,
            phone_number: agent.phone_number,
            created_at: now_epoch_ms(),
        };

        let inserted = self.conn.execute(
            "INSERT INTO agents (
                id,
                name,
                email,
                phone_number,
                credential_hash,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                created.id.to_string(),
                created.name.as_str(),
                created.email.as_str(),
                created.phone_number.as_str(),
                credential_hash,
                created.created_at,
            ],
        );

        match inserted {
            Ok(_) => Ok(created),
            // A concurrent writer may win the race after the pre-check.
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::DuplicateEmail(created.email))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn get_agent(&self, id: AgentId) -> RepoResult<Option<Agent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{AGENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_agent_row(row)?));
        }

        Ok(None)
    }

    fn list_agents(&self) -> RepoResult<Vec<Agent>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AGENT_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut agents = Vec::new();
        while let Some(row) = rows.next()? {
            agents.push(parse_agent_row(row)?);
        }

        Ok(agents)
    }

    fn delete_agent(&self, id: AgentId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM agents WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "agent", id });
        }

        Ok(())
    }
}

fn email_taken(conn: &Connection, email: &str) -> RepoResult<bool> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM agents WHERE email = ?1 COLLATE NOCASE LIMIT 1;",
            [normalize_email(email)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(existing.is_some())
}

fn parse_agent_row(row: &Row<'_>) -> RepoResult<Agent> {
    let id_text: String = row.get("id")?;
    Ok(Agent {
        id: parse_uuid(&id_text, "agents.id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        phone_number: row.get("phone_number")?,
        created_at: row.get("created_at")?,
    })
}
