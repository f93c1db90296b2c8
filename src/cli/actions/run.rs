use crate::cli::actions::{decrypt_seed, keygen, log_code, request_seed, server, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
        Action::LogCode(args) => log_code::execute(args).await,
        Action::Keygen(args) => keygen::execute(args).await,
        Action::RequestSeed(args) => request_seed::execute(args).await,
        Action::DecryptSeed(args) => decrypt_seed::execute(args).await,
    }
}
