//! Personbook console entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging, open the store once.
//! - Drive the interactive menu and close the store on every exit path.

mod config;
mod console;

use clap::Parser;
use config::CliConfig;
use console::Console;
use log::{error, info};
use personbook_core::{init_logging, PersonService, SqlitePersonRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = CliConfig::parse();

    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(config.effective_log_level(), log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let db = match config.open_database() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("failed to open database `{}`: {err}", config.db);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "event=cli_start module=cli status=ok mode={} version={}",
        db.mode(),
        personbook_core::core_version()
    );

    let run_result = {
        let service = PersonService::new(SqlitePersonRepository::new(&db));
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        Console::new(service, stdin.lock(), stdout.lock()).run()
    };

    let close_result = db.close();

    if let Err(err) = &run_result {
        error!("event=cli_run module=cli status=error error={err}");
        eprintln!("console error: {err}");
    }
    if let Err(err) = &close_result {
        error!("event=db_close module=cli status=error error={err}");
        eprintln!("failed to close database: {err}");
    }

    if run_result.is_ok() && close_result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
