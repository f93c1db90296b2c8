pub mod exchange;
pub mod logging;
pub mod storage;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ArgMatches, ColorChoice, Command,
};

pub const CMD_SERVER: &str = "server";
pub const CMD_LOG_CODE: &str = "log-code";
pub const CMD_KEYGEN: &str = "keygen";
pub const CMD_REQUEST_SEED: &str = "request-seed";
pub const CMD_DECRYPT_SEED: &str = "decrypt-seed";

/// Matches of the selected subcommand, where global arguments are propagated.
#[must_use]
pub fn leaf(matches: &ArgMatches) -> &ArgMatches {
    match matches.subcommand() {
        Some((_, sub)) => leaf(sub),
        None => matches,
    }
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("pki-totp")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(server())
        .subcommand(log_code())
        .subcommand(keygen())
        .subcommand(exchange::with_args(
            Command::new(CMD_REQUEST_SEED)
                .about("Send the public key to the provisioning authority and save the encrypted seed"),
        ))
        .subcommand(decrypt_seed());

    let command = storage::with_args(command);
    logging::with_args(command)
}

fn server() -> Command {
    Command::new(CMD_SERVER).about("Serve the HTTP API").arg(
        Arg::new("port")
            .short('p')
            .long("port")
            .help("Port to listen on")
            .default_value("8080")
            .env("PKI_TOTP_PORT")
            .value_parser(clap::value_parser!(u16)),
    )
}

fn log_code() -> Command {
    Command::new(CMD_LOG_CODE)
        .about("Print the current code with a UTC timestamp on a fixed schedule")
        .arg(
            Arg::new("interval")
                .long("interval")
                .help("Seconds between two lines")
                .default_value("60")
                .env("PKI_TOTP_LOG_INTERVAL")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Print a single line and exit (for use from cron)")
                .action(ArgAction::SetTrue),
        )
}

fn keygen() -> Command {
    Command::new(CMD_KEYGEN)
        .about("Generate the RSA key pair used to receive the seed")
        .arg(
            Arg::new("bits")
                .long("bits")
                .help("Modulus size in bits")
                .default_value("4096")
                .value_parser(clap::value_parser!(u64).range(2048..=16384)),
        )
        .arg(
            Arg::new(exchange::ARG_PUBLIC_KEY)
                .long(exchange::ARG_PUBLIC_KEY)
                .help("Where to write the public key")
                .default_value("student_public.pem")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
}

fn decrypt_seed() -> Command {
    Command::new(CMD_DECRYPT_SEED)
        .about("Decrypt an encrypted seed file and store the seed")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("File holding the base64 ciphertext")
                .default_value("encrypted_seed.txt")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "pki-totp");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some(env!("CARGO_PKG_DESCRIPTION").to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_subcommand_required() {
        let result = new().try_get_matches_from(vec!["pki-totp"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_defaults() {
        temp_env::with_vars(
            [
                ("PKI_TOTP_PORT", None::<&str>),
                ("PKI_TOTP_PRIVATE_KEY", None),
                ("PKI_TOTP_SEED_FILE", None),
                ("PKI_TOTP_LOG_LEVEL", None),
            ],
            || {
                let matches = new().get_matches_from(vec!["pki-totp", "server"]);
                let sub = leaf(&matches);
                assert_eq!(sub.get_one::<u16>("port").copied(), Some(8080));
                assert_eq!(
                    sub.get_one::<PathBuf>(storage::ARG_PRIVATE_KEY).cloned(),
                    Some(PathBuf::from("student_private.pem"))
                );
                assert_eq!(
                    sub.get_one::<PathBuf>(storage::ARG_SEED_FILE).cloned(),
                    Some(PathBuf::from("/data/seed.txt"))
                );
                assert_eq!(sub.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(0));
            },
        );
    }

    #[test]
    fn test_global_args_before_and_after_subcommand() {
        let matches = new().get_matches_from(vec![
            "pki-totp",
            "--seed-file",
            "/tmp/seed.txt",
            "server",
            "--private-key",
            "/tmp/key.pem",
            "--port",
            "9090",
        ]);
        let sub = leaf(&matches);
        assert_eq!(sub.get_one::<u16>("port").copied(), Some(9090));
        assert_eq!(
            sub.get_one::<PathBuf>(storage::ARG_SEED_FILE).cloned(),
            Some(PathBuf::from("/tmp/seed.txt"))
        );
        assert_eq!(
            sub.get_one::<PathBuf>(storage::ARG_PRIVATE_KEY).cloned(),
            Some(PathBuf::from("/tmp/key.pem"))
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("PKI_TOTP_PORT", Some("443")),
                ("PKI_TOTP_PRIVATE_KEY", Some("/keys/private.pem")),
                ("PKI_TOTP_SEED_FILE", Some("/var/lib/pki-totp/seed.txt")),
                ("PKI_TOTP_LOG_LEVEL", Some("info")),
            ],
            || {
                let matches = new().get_matches_from(vec!["pki-totp", "server"]);
                let sub = leaf(&matches);
                assert_eq!(sub.get_one::<u16>("port").copied(), Some(443));
                assert_eq!(
                    sub.get_one::<PathBuf>(storage::ARG_PRIVATE_KEY).cloned(),
                    Some(PathBuf::from("/keys/private.pem"))
                );
                assert_eq!(
                    sub.get_one::<PathBuf>(storage::ARG_SEED_FILE).cloned(),
                    Some(PathBuf::from("/var/lib/pki-totp/seed.txt"))
                );
                assert_eq!(sub.get_one::<u8>(logging::ARG_VERBOSITY).copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("PKI_TOTP_LOG_LEVEL", Some(level))], || {
                let matches = new().get_matches_from(vec!["pki-totp", "log-code"]);
                assert_eq!(
                    leaf(&matches).get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("PKI_TOTP_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["pki-totp".to_string(), "server".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let matches = new().get_matches_from(args);

                assert_eq!(
                    leaf(&matches).get_one::<u8>(logging::ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_log_code_args() {
        temp_env::with_vars([("PKI_TOTP_LOG_INTERVAL", None::<&str>)], || {
            let matches = new().get_matches_from(vec!["pki-totp", "log-code", "--once"]);
            let sub = leaf(&matches);
            assert_eq!(sub.get_one::<u64>("interval").copied(), Some(60));
            assert!(sub.get_flag("once"));
        });

        let result = new().try_get_matches_from(vec!["pki-totp", "log-code", "--interval", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_keygen_rejects_small_keys() {
        let result = new().try_get_matches_from(vec!["pki-totp", "keygen", "--bits", "1024"]);
        assert!(result.is_err());

        let matches = new().get_matches_from(vec!["pki-totp", "keygen"]);
        let sub = leaf(&matches);
        assert_eq!(sub.get_one::<u64>("bits").copied(), Some(4096));
        assert_eq!(
            sub.get_one::<PathBuf>(exchange::ARG_PUBLIC_KEY).cloned(),
            Some(PathBuf::from("student_public.pem"))
        );
    }

    #[test]
    fn test_request_seed_requires_identity() {
        temp_env::with_vars(
            [
                ("PKI_TOTP_API_URL", None::<&str>),
                ("PKI_TOTP_STUDENT_ID", None),
                ("PKI_TOTP_REPO_URL", None),
            ],
            || {
                let result = new().try_get_matches_from(vec!["pki-totp", "request-seed"]);
                assert_eq!(
                    result.map(|_| ()).map_err(|e| e.kind()),
                    Err(clap::error::ErrorKind::MissingRequiredArgument)
                );
            },
        );

        temp_env::with_vars(
            [
                ("PKI_TOTP_API_URL", Some("https://authority.tld/seed")),
                ("PKI_TOTP_STUDENT_ID", Some("S-001")),
                ("PKI_TOTP_REPO_URL", Some("https://git.tld/me/repo")),
            ],
            || {
                let matches = new().get_matches_from(vec!["pki-totp", "request-seed"]);
                let sub = leaf(&matches);
                assert_eq!(
                    sub.get_one::<String>(exchange::ARG_STUDENT_ID).cloned(),
                    Some("S-001".to_string())
                );
                assert_eq!(
                    sub.get_one::<PathBuf>(exchange::ARG_OUTPUT).cloned(),
                    Some(PathBuf::from("encrypted_seed.txt"))
                );
            },
        );
    }
}
