use crate::{
    api::{self, AppState},
    cli::globals::GlobalArgs,
    seed::SeedStore,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub globals: GlobalArgs,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to bind or exits abnormally.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let state = AppState::new(
        Arc::new(args.globals.key_provider()),
        Arc::new(args.globals.seed_store()),
    );

    api::new(args.port, state).await
}

fn log_startup_args(args: &Args) {
    let seed_status = match args.globals.seed_store().get() {
        Ok(_) => "provisioned",
        Err(crate::Error::SeedNotProvisioned) => "missing",
        Err(_) => "unreadable",
    };
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("private_key", args.globals.private_key.display().to_string()),
        ("seed_file", args.globals.seed_file.display().to_string()),
        ("seed", seed_status.to_string()),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn banner() -> String {
    BANNER.replace(
        "{VERSION}",
        &format!(
            " - {} - {}",
            env!("CARGO_PKG_VERSION"),
            short_commit(crate::GIT_COMMIT_HASH)
        ),
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

const BANNER: &str = r"
   +-------+
   | 0 4 2 |
   | 9 1 7 |   P K I - T O T P {VERSION}
   +-------+";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_commit() {
        assert_eq!(short_commit("0123456789abcdef"), "0123456");
        assert_eq!(short_commit(" abc "), "abc");
        assert_eq!(short_commit("unknown"), "unknown");
    }

    #[test]
    fn test_banner_has_version() {
        assert!(banner().contains(env!("CARGO_PKG_VERSION")));
        assert!(!banner().contains("{VERSION}"));
    }
}
