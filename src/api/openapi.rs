use crate::api::handlers::{decrypt_seed, health, root, two_factor};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Router that both serves the documented endpoints and drives the `OpenAPI`
/// document. `OPTIONS /health` is added outside and stays undocumented.
pub(crate) fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(root::root))
        .routes(routes!(health::health))
        .routes(routes!(decrypt_seed::decrypt_seed))
        .routes(routes!(two_factor::generate))
        .routes(routes!(two_factor::verify))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(non_empty(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).tags(Some(tags())).build()
}

fn tags() -> Vec<Tag> {
    let mut seed = Tag::new("seed");
    seed.description = Some("Seed provisioning".to_string());
    let mut two_factor = Tag::new("2fa");
    two_factor.description = Some("Time-based one-time codes".to_string());
    vec![seed, two_factor]
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let primary = env!("CARGO_PKG_AUTHORS").split(';').next().map(str::trim)?;
    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = non_empty(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, email)) => (non_empty(name), non_empty(email.trim_end_matches('>'))),
        None => (non_empty(author), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_author() {
        assert_eq!(
            parse_author("Team pki-totp <team@pki-totp.dev>"),
            (Some("Team pki-totp"), Some("team@pki-totp.dev"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
        assert_eq!(parse_author("<only@mail>"), (None, Some("only@mail")));
        assert_eq!(parse_author("  "), (None, None));
    }

    #[test]
    fn test_openapi_document() -> anyhow::Result<()> {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));

        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for path in ["/", "/health", "/decrypt-seed", "/generate-2fa", "/verify-2fa"] {
            assert!(paths.contains(&path), "missing {path} in {paths:?}");
        }

        let tags: Vec<&str> = doc
            .tags
            .iter()
            .flatten()
            .map(|tag| tag.name.as_str())
            .collect();
        assert_eq!(tags, ["seed", "2fa"]);

        let json = serde_json::to_value(&doc)?;
        assert!(json["components"]["schemas"]["DecryptRequest"].is_object());
        Ok(())
    }
}
