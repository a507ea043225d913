//! Setup-time checks that must pass before a configuration is written.

use homeflux_client::api::{validate_credentials, IngestTarget, Transport, ValidationError, DEFAULT_ENDPOINT};

use crate::config::{AppConfig, ConfigError};

#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Probe target for a draft: the production endpoint with the draft's token and timeout.
pub fn production_target(draft: &AppConfig) -> IngestTarget {
    IngestTarget::production(&draft.reporter.token).with_timeout(draft.request_timeout())
}

/// Check the draft's token against `probe` and return the configuration to persist.
///
/// The accepted configuration always points at the production endpoint.
pub async fn accept(
    transport: &dyn Transport,
    probe: &IngestTarget,
    draft: AppConfig,
) -> Result<AppConfig, SetupError> {
    draft.validate()?;
    validate_credentials(transport, probe).await?;

    let mut accepted = draft;
    accepted.reporter.endpoint = DEFAULT_ENDPOINT.to_string();
    tracing::info!(endpoint = %accepted.reporter.endpoint, "credentials validated");
    Ok(accepted)
}
