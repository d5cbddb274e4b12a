//! CLI subcommands.

pub mod migrate;
pub mod seed;

/// Read `STOREFRONT_DATABASE_URL`, loading `.env` first.
fn database_url() -> Result<secrecy::SecretString, MissingEnvVar> {
    dotenvy::dotenv().ok();
    std::env::var("STOREFRONT_DATABASE_URL")
        .map(secrecy::SecretString::from)
        .map_err(|_| MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Required environment variable is missing.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVar(pub &'static str);
