pub mod decrypt_seed;
pub mod keygen;
pub mod log_code;
pub mod request_seed;
pub mod server;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

#[derive(Debug)]
pub enum Action {
    Server(server::Args),
    LogCode(log_code::Args),
    Keygen(keygen::Args),
    RequestSeed(request_seed::Args),
    DecryptSeed(decrypt_seed::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
