// Statistics, session history and event log handlers
use anyhow::Result;

use crate::output::OutputFormat;
use crate::storage::Database;

pub fn handle_stats_command(database: &Database, json_output: bool, colored: bool) -> Result<()> {
    let stats = database.statistics()?;

    if json_output {
        println!("{}", stats.to_json()?);
    } else {
        println!("{}", stats.to_table(colored));
    }

    Ok(())
}

pub fn handle_sessions_command(database: &Database, limit: usize, json_output: bool, colored: bool) -> Result<()> {
    let sessions = database.list_sessions(limit)?;

    if json_output {
        println!("{}", sessions.to_json()?);
    } else {
        println!("{}", sessions.to_table(colored));
    }

    Ok(())
}

pub fn handle_logs_command(database: &Database, limit: usize, json_output: bool, colored: bool) -> Result<()> {
    let logs = database.recent_logs(limit)?;

    if json_output {
        println!("{}", logs.to_json()?);
    } else {
        println!("{}", logs.to_table(colored));
    }

    Ok(())
}
