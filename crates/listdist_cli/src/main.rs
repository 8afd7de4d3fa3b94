//! Operator CLI for offline list distribution.
//!
//! # Responsibility
//! - Run the same core use-cases as the HTTP server against a local DB file.
//! - Print results as pretty JSON on stdout; diagnostics go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use listdist_core::db::open_db;
use listdist_core::{
    init_stderr_logging, AgentId, AgentService, DistributionService, NewAgent,
    SqliteAgentRepository, SqliteListRepository,
};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "listdist", version)]
#[command(about = "Distribute contact lists across registered agents")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "LISTDIST_DB_PATH", default_value = "listdist.sqlite3", global = true)]
    db_path: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "LISTDIST_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and validate a .csv/.xlsx/.xls file without storing anything
    Preview { file: PathBuf },
    /// Manage registered agents
    #[command(subcommand)]
    Agents(AgentCommand),
    /// Deal a file round-robin across all agents and replace stored lists
    Distribute { file: PathBuf },
    /// Print the stored distribution
    Lists {
        /// Only the list assigned to this agent
        #[arg(long)]
        agent: Option<AgentId>,
    },
}

#[derive(Subcommand)]
enum AgentCommand {
    /// List agents in registration order
    List,
    /// Register a new agent
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long, env = "LISTDIST_AGENT_CREDENTIAL", hide_env_values = true)]
        credential: String,
    },
    /// Remove an agent; lists already assigned to it stay stored
    Remove { id: AgentId },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_stderr_logging(&cli.log_level)?;

    let conn = open_db(&cli.db_path)
        .with_context(|| format!("failed to open database `{}`", cli.db_path.display()))?;

    match cli.command {
        Command::Preview { file } => {
            let bytes = read_upload(&file)?;
            let records = distribution_service(&conn)?.preview(&file_name(&file)?, &bytes)?;
            print_json(&records)
        }
        Command::Agents(command) => run_agent_command(&conn, command),
        Command::Distribute { file } => {
            let bytes = read_upload(&file)?;
            let outcome =
                distribution_service(&conn)?.distribute_upload(&file_name(&file)?, &bytes)?;
            info!(
                "event=cli_distribute module=cli status=ok record_count={} agent_count={}",
                outcome.total_items, outcome.agent_count
            );
            print_json(&outcome.lists)
        }
        Command::Lists { agent } => {
            let service = distribution_service(&conn)?;
            match agent {
                Some(id) => print_json(&service.get_by_agent(id)?),
                None => print_json(&service.list_all()?),
            }
        }
    }
}

fn run_agent_command(conn: &Connection, command: AgentCommand) -> anyhow::Result<()> {
    let service = AgentService::new(SqliteAgentRepository::try_new(conn)?);
    match command {
        AgentCommand::List => print_json(&service.list_agents()?),
        AgentCommand::Add {
            name,
            email,
            phone,
            credential,
        } => {
            let agent = service.register_agent(&NewAgent::new(name, email, phone, credential))?;
            print_json(&agent)
        }
        AgentCommand::Remove { id } => {
            service.remove_agent(id)?;
            eprintln!("removed agent {id}");
            Ok(())
        }
    }
}

fn distribution_service(
    conn: &Connection,
) -> anyhow::Result<DistributionService<SqliteAgentRepository<'_>, SqliteListRepository<'_>>> {
    Ok(DistributionService::new(
        SqliteAgentRepository::try_new(conn)?,
        SqliteListRepository::try_new(conn)?,
    ))
}

fn read_upload(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("`{}` has no usable file name", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
