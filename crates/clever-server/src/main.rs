use std::io::ErrorKind;

use clever_server::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use clever_server::{ServerBuilder, init_tracing};

/// Where the config file path came from.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    Flag,
    Env,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Flag => "--config",
            Self::Env => "CLEVER_CONFIG",
            Self::Default => "default",
        })
    }
}

#[tokio::main]
async fn main() {
    load_dotenv();

    let (config_path, source) = config_path(std::env::args().skip(1));
    let cfg = match load_config(Some(&config_path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    init_tracing(&cfg.logging.level);
    tracing::info!(
        path = %config_path,
        source = %source,
        production = cfg.server.production,
        redirect_uri = %cfg.redirect_uri(),
        "Configuration loaded"
    );

    let server = match ServerBuilder::new().with_config(cfg).build() {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Server initialization failed");
            std::process::exit(2);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}

/// Loads `.env` into the process environment. A missing file is fine.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => eprintln!("Warning: ignoring .env: {e}"),
    }
}

fn config_path(args: impl Iterator<Item = String>) -> (String, ConfigSource) {
    if let Some(path) = args.skip_while(|a| a != "--config").nth(1) {
        return (path, ConfigSource::Flag);
    }

    match std::env::var("CLEVER_CONFIG") {
        Ok(path) if !path.is_empty() => (path, ConfigSource::Env),
        _ => (DEFAULT_CONFIG_PATH.to_string(), ConfigSource::Default),
    }
}
