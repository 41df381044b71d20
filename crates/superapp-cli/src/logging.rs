use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used, raised to
/// `debug` or `trace` for the shell's own targets by `-v` / `-vv`.
pub fn init(default_filter: &str, verbosity: u8) {
	let fallback = match verbosity {
		0 => default_filter.to_string(),
		1 => format!("{},superapp=debug", default_filter),
		_ => format!("{},superapp=trace", default_filter),
	};
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.init();
}
