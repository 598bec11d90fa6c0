use routedoc::logging::{init_logging_with_config, LogConfig, LogFormat};

fn main() {
    // Quiet by default; progress is logged at info
    let guard = match init_logging_with_config(&LogConfig::from_env_with_defaults(
        "warn",
        LogFormat::Pretty,
    )) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: logging disabled: {err:#}");
            None
        }
    };

    let result = routedoc::cli::run_cli();
    // Flush buffered log lines before exiting
    drop(guard);
    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
