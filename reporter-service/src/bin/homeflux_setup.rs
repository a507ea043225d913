use anyhow::{bail, Result};
use homeflux_client::api::{ReqwestTransport, ValidationError};
use reporter_service::{
    config::AppConfig,
    observability,
    setup::{self, SetupError},
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: homeflux_setup <draft_config.toml> <output_config.toml> [interval_secs]");
    }
    let draft_path = &args[1];
    let output_path = &args[2];

    let mut draft = AppConfig::load_from(draft_path)?;
    if let Some(interval) = args.get(3) {
        let interval: u64 = interval
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid interval_secs '{interval}': {e}"))?;
        draft = draft.with_interval(interval)?;
    }

    let transport = ReqwestTransport::new()?;
    let probe = setup::production_target(&draft);

    let accepted = match setup::accept(&transport, &probe, draft).await {
        Ok(cfg) => cfg,
        Err(SetupError::Validation(ValidationError::InvalidAuth)) => {
            bail!("invalid_auth: the token was rejected, nothing was written")
        }
        Err(SetupError::Validation(e @ ValidationError::CannotConnect(_))) => {
            bail!("cannot_connect: {e}")
        }
        Err(e) => bail!("unknown: {e}"),
    };

    accepted.save(output_path)?;
    tracing::info!(path = %output_path, "configuration written");

    Ok(())
}
