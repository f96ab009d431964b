use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use ccdb_config::Config;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn write_temp_config(payload: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("ccdb_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads_and_normalizes() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML);
	let result = ccdb_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");

	assert_eq!(cfg.engine.url, "http://127.0.0.1:9200");
	assert!(cfg.engine.username.is_none());
	assert!(cfg.engine.password.is_none());
	assert_eq!(cfg.pagination.batch_unit, 100);
	assert!(!cfg.flags.data_issue);
}

#[test]
fn unreadable_path_reports_read_error() {
	let path = env::temp_dir().join("ccdb_config_test_missing_file.toml");
	let err = ccdb_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, ccdb_config::Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn malformed_toml_reports_parse_error() {
	let path = write_temp_config("[service\nhttp_bind = 1");
	let result = ccdb_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected parse error.");

	assert!(matches!(err, ccdb_config::Error::ParseConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn trends_section_is_optional() {
	let mut table: toml::Table =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");

	table.remove("trends").expect("Template config must include [trends].");

	let payload = toml::to_string(&table).expect("Failed to render template config.");
	let cfg: Config = toml::from_str(&payload).expect("Failed to parse test config.");

	assert_eq!(cfg.trends.default_trend_depth, 5);
	assert_eq!(cfg.trends.default_sub_lens_depth, 10);
	assert!(ccdb_config::validate(&cfg).is_ok());
}

#[test]
fn max_depth_must_cover_one_batch() {
	let mut cfg = base_config();

	cfg.pagination.max_depth = 50;

	let err = ccdb_config::validate(&cfg).expect_err("Expected max_depth validation error.");

	assert!(
		err.to_string().contains("pagination.max_depth must be at least pagination.batch_unit."),
		"Unexpected error: {err}"
	);
}

#[test]
fn batch_unit_must_be_positive() {
	let mut cfg = base_config();

	cfg.pagination.batch_unit = 0;

	let err = ccdb_config::validate(&cfg).expect_err("Expected batch_unit validation error.");

	assert!(
		err.to_string().contains("pagination.batch_unit must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn default_size_must_not_exceed_max_size() {
	let mut cfg = base_config();

	cfg.pagination.default_size = 500;

	let err = ccdb_config::validate(&cfg).expect_err("Expected default_size validation error.");

	assert!(
		err.to_string().contains("pagination.default_size must be in the range"),
		"Unexpected error: {err}"
	);
}

#[test]
fn staleness_window_must_be_positive() {
	let mut cfg = base_config();

	cfg.meta.staleness_days = 0;

	let err = ccdb_config::validate(&cfg).expect_err("Expected staleness validation error.");

	assert!(
		err.to_string().contains("meta.staleness_days must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn engine_credentials_must_be_paired() {
	let mut cfg = base_config();

	cfg.engine.url = "http://localhost:9200".to_string();
	cfg.engine.username = Some("reader".to_string());
	cfg.engine.password = None;

	let err = ccdb_config::validate(&cfg).expect_err("Expected credential validation error.");

	assert!(
		err.to_string().contains("engine.username and engine.password must be set together."),
		"Unexpected error: {err}"
	);
}

#[test]
fn engine_url_requires_http_scheme() {
	let mut cfg = base_config();

	cfg.engine.url = "localhost:9200".to_string();

	let err = ccdb_config::validate(&cfg).expect_err("Expected engine.url validation error.");

	assert!(err.to_string().contains("engine.url must start with"), "Unexpected error: {err}");
}
