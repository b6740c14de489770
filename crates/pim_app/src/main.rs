use std::path::PathBuf;

use pim_app::app::{run, AppConfig};

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let mut config = AppConfig::from_env().unwrap_or_default();
    if let Some(path) = std::env::args_os().nth(1) {
        config.session_path = Some(PathBuf::from(path));
    }
    if let Err(err) = run(config) {
        eprintln!("Failed to replay session: {err:#}");
        std::process::exit(1);
    }
}
