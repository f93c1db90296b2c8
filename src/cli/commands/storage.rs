use clap::{Arg, Command};
use std::path::PathBuf;

pub const ARG_PRIVATE_KEY: &str = "private-key";
pub const ARG_SEED_FILE: &str = "seed-file";

/// Key and seed locations shared by every subcommand.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PRIVATE_KEY)
                .long(ARG_PRIVATE_KEY)
                .help("Path to the RSA private key (PEM, PKCS#8 or PKCS#1)")
                .env("PKI_TOTP_PRIVATE_KEY")
                .default_value("student_private.pem")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_SEED_FILE)
                .long(ARG_SEED_FILE)
                .help("Path of the file holding the decrypted seed")
                .env("PKI_TOTP_SEED_FILE")
                .default_value("/data/seed.txt")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
}
