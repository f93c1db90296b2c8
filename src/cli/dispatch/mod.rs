use crate::cli::{
    actions::{decrypt_seed, keygen, log_code, request_seed, server, Action},
    commands::{self, exchange},
    globals::GlobalArgs,
};
use crate::seed::keys::DEFAULT_KEY_BITS;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let Some((name, sub)) = matches.subcommand() else {
        return Err(anyhow!("missing subcommand"));
    };
    let globals = GlobalArgs::from_matches(sub)?;

    match name {
        commands::CMD_SERVER => {
            let port = sub.get_one::<u16>("port").copied().unwrap_or(8080);
            Ok(Action::Server(server::Args { port, globals }))
        }
        commands::CMD_LOG_CODE => {
            let interval = sub.get_one::<u64>("interval").copied().unwrap_or(60);
            let once = sub.get_flag("once");
            Ok(Action::LogCode(log_code::Args {
                globals,
                interval,
                once,
            }))
        }
        commands::CMD_KEYGEN => {
            let bits = match sub.get_one::<u64>("bits") {
                Some(&bits) => usize::try_from(bits).context("invalid --bits")?,
                None => DEFAULT_KEY_BITS,
            };
            let public_key = path_arg(sub, exchange::ARG_PUBLIC_KEY)?;
            Ok(Action::Keygen(keygen::Args {
                globals,
                bits,
                public_key,
            }))
        }
        commands::CMD_REQUEST_SEED => {
            let api_url = string_arg(sub, exchange::ARG_API_URL)?;
            let api_url = url::Url::parse(&api_url).context("invalid --api-url")?;
            Ok(Action::RequestSeed(request_seed::Args {
                api_url,
                student_id: string_arg(sub, exchange::ARG_STUDENT_ID)?,
                repo_url: string_arg(sub, exchange::ARG_REPO_URL)?,
                public_key: path_arg(sub, exchange::ARG_PUBLIC_KEY)?,
                output: path_arg(sub, exchange::ARG_OUTPUT)?,
            }))
        }
        commands::CMD_DECRYPT_SEED => {
            let input = path_arg(sub, "input")?;
            Ok(Action::DecryptSeed(decrypt_seed::Args { globals, input }))
        }
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}

fn string_arg(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn path_arg(matches: &clap::ArgMatches, name: &str) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}
