use register::cli::run;
use register::config::Config;
use register::error::RegisterError;

fn main() {
    let config = Config::load();
    init_logging(config.as_ref().ok());
    match &config {
        Ok(config) => config.log_warnings(),
        Err(e) => log::warn!("{:#}", e),
    }

    if let Err(e) = run() {
        if is_internal(&e) {
            eprintln!("Internal error: {}", e);
            // Show error chain if available
            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut indent = 1;
                while let Some(err) = source {
                    eprintln!("{:indent$}  {}", "", err);
                    source = err.source();
                    indent += 1;
                }
            }
            std::process::exit(2);
        } else {
            // User error
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// RUST_LOG wins over log.level from the rc file
fn init_logging(config: Option<&Config>) {
    let level = config
        .and_then(|config| config.log_level.clone())
        .unwrap_or_else(|| "warn".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Broken caller contracts and storage failures, as opposed to bad input
fn is_internal(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause
            .downcast_ref::<RegisterError>()
            .map_or(false, RegisterError::is_internal)
            || cause.downcast_ref::<rusqlite::Error>().is_some()
    })
}
