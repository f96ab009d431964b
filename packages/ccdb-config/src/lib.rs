mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Engine, Export, Flags, Meta, Pagination, Service, Trends};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if !cfg.engine.url.starts_with("http://") && !cfg.engine.url.starts_with("https://") {
		return Err(Error::Validation {
			message: "engine.url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.engine.index.trim().is_empty() {
		return Err(Error::Validation { message: "engine.index must be non-empty.".to_string() });
	}
	if cfg.engine.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "engine.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.engine.username.is_some() != cfg.engine.password.is_some() {
		return Err(Error::Validation {
			message: "engine.username and engine.password must be set together.".to_string(),
		});
	}
	if cfg.pagination.batch_unit == 0 {
		return Err(Error::Validation {
			message: "pagination.batch_unit must be greater than zero.".to_string(),
		});
	}
	if cfg.pagination.max_depth < cfg.pagination.batch_unit {
		return Err(Error::Validation {
			message: "pagination.max_depth must be at least pagination.batch_unit.".to_string(),
		});
	}
	if cfg.pagination.max_size == 0 || cfg.pagination.max_size > cfg.pagination.max_depth {
		return Err(Error::Validation {
			message: "pagination.max_size must be in the range 1-pagination.max_depth."
				.to_string(),
		});
	}
	if cfg.pagination.default_size == 0 || cfg.pagination.default_size > cfg.pagination.max_size {
		return Err(Error::Validation {
			message: "pagination.default_size must be in the range 1-pagination.max_size."
				.to_string(),
		});
	}
	if cfg.meta.staleness_days <= 0 {
		return Err(Error::Validation {
			message: "meta.staleness_days must be greater than zero.".to_string(),
		});
	}
	if cfg.trends.default_trend_depth == 0 || cfg.trends.default_sub_lens_depth == 0 {
		return Err(Error::Validation {
			message: "trends default depths must be greater than zero.".to_string(),
		});
	}
	if cfg.trends.default_trend_depth > cfg.trends.max_depth
		|| cfg.trends.default_sub_lens_depth > cfg.trends.max_depth
	{
		return Err(Error::Validation {
			message: "trends default depths must not exceed trends.max_depth.".to_string(),
		});
	}
	if cfg.export.scroll_keep_alive.trim().is_empty() {
		return Err(Error::Validation {
			message: "export.scroll_keep_alive must be non-empty.".to_string(),
		});
	}
	if cfg.export.batch_size == 0 {
		return Err(Error::Validation {
			message: "export.batch_size must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	while cfg.engine.url.ends_with('/') {
		cfg.engine.url.pop();
	}

	if cfg.engine.username.as_deref().map(|user| user.trim().is_empty()).unwrap_or(false) {
		cfg.engine.username = None;
	}
	if cfg.engine.password.as_deref().map(|pass| pass.is_empty()).unwrap_or(false) {
		cfg.engine.password = None;
	}
}
