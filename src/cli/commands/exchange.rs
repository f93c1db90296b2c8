use clap::{Arg, Command};
use std::path::PathBuf;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STUDENT_ID: &str = "student-id";
pub const ARG_REPO_URL: &str = "repo-url";
pub const ARG_PUBLIC_KEY: &str = "public-key";
pub const ARG_OUTPUT: &str = "output";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Provisioning authority endpoint")
                .env("PKI_TOTP_API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_STUDENT_ID)
                .long(ARG_STUDENT_ID)
                .help("Identifier registered with the provisioning authority")
                .env("PKI_TOTP_STUDENT_ID")
                .required(true),
        )
        .arg(
            Arg::new(ARG_REPO_URL)
                .long(ARG_REPO_URL)
                .help("Repository URL registered with the provisioning authority")
                .env("PKI_TOTP_REPO_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PUBLIC_KEY)
                .long(ARG_PUBLIC_KEY)
                .help("Public key to send (SubjectPublicKeyInfo PEM)")
                .default_value("student_public.pem")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_OUTPUT)
                .short('o')
                .long(ARG_OUTPUT)
                .help("Where to write the encrypted seed")
                .default_value("encrypted_seed.txt")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}
