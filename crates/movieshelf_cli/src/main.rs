//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `movieshelf_core` linkage without the Flutter host.
//! - Report whether the `MOVIESHELF_*` configuration (optionally from a
//!   `.env` file) is complete.

use movieshelf_core::AppConfig;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("movieshelf_core ping={}", movieshelf_core::ping());
    println!("movieshelf_core version={}", movieshelf_core::core_version());

    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("config env_file=error error={err}");
            return ExitCode::FAILURE;
        }
    }

    match AppConfig::from_env() {
        Ok(config) => {
            println!(
                "config status=ok metadata={} store={} database={} saved_table={} search_table={}",
                config.metadata.base_url,
                config.store.endpoint,
                config.store.database_id,
                config.store.saved_table_id,
                config.store.search_table_id
            );
            if config.metadata.api_key.is_empty() {
                println!("config warning=MOVIESHELF_TMDB_API_KEY is empty");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("config status=error error={err}");
            ExitCode::FAILURE
        }
    }
}
