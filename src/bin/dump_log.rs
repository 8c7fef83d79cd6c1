//! Print the most recent rows of the message log.
//!
//! Usage: cargo run --bin dump_log [data.db] [limit]

use std::path::PathBuf;
use std::process::ExitCode;

use ashim_relay::relay::MessageLog;

const DEFAULT_LIMIT: usize = 20;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let path = PathBuf::from(args.next().unwrap_or_else(|| "data.db".to_string()));
    let limit = match args.next().map(|raw| raw.parse::<usize>()) {
        Some(Ok(limit)) => limit,
        Some(Err(e)) => {
            eprintln!("Invalid limit: {e}");
            return ExitCode::FAILURE;
        }
        None => DEFAULT_LIMIT,
    };

    if !path.exists() {
        eprintln!("No message log at {}", path.display());
        return ExitCode::FAILURE;
    }

    let log = match MessageLog::open_read_only(&path) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let rows = match log.recent(limit) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Oldest first, like a transcript.
    for row in rows.iter().rev() {
        let text = row.message_text.replace('\n', "\\n");
        println!(
            "{}\t{}\t{}\t{}",
            row.id,
            row.user_id,
            row.username.as_deref().unwrap_or("-"),
            text
        );
    }

    ExitCode::SUCCESS
}
