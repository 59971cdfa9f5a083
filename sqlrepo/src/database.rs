use std::time::Duration;

use sqlx::{
	postgres::PgPoolOptions,
	PgPool,
};

use crate::{
	config::DatabaseConfig,
	error::{
		Error,
		Result,
	},
};

/// Opens the pool repositories run their statements on.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
	let pool = PgPoolOptions::new()
		.max_connections(config.max_connections)
		.min_connections(config.min_connections)
		.acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
		.connect(&config.url)
		.await
		.map_err(|e| {
			Error::InvalidConfiguration(format!(
				"failed to connect to {}: {e}",
				redact(&config.url)
			))
		})?;

	tracing::info!(
		max_connections = config.max_connections,
		"connected to {}",
		redact(&config.url)
	);

	Ok(pool)
}

/// Drops the password from a connection url.
fn redact(url: &str) -> String {
	let Some((scheme, rest)) = url.split_once("://") else {
		return url.to_owned();
	};
	let Some((credentials, host)) = rest.rsplit_once('@') else {
		return url.to_owned();
	};

	match credentials.split_once(':') {
		Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
		None => url.to_owned(),
	}
}
