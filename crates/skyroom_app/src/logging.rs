use anyhow::Context;
use log::LevelFilter;

use crate::builder::LogConfig;

/// Crates whose chatter is capped at `Warn` whatever the configured level.
const NOISY_TARGETS: &[&str] = &["wgpu_core", "wgpu_hal", "naga"];

/// Installs the global logger: `[LEVEL target] message` lines on stderr and,
/// when configured, in a log file.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(config.level_filter());
    for target in NOISY_TARGETS {
        dispatch = dispatch.level_for(*target, LevelFilter::Warn.min(config.level_filter()));
    }
    dispatch = dispatch.chain(std::io::stderr());

    if let Some(path) = &config.file {
        let file = fern::log_file(path).with_context(|| format!("Could not open log file {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().context("a global logger is already installed")?;
    log::debug!("Logging at {}", config.level_filter());
    Ok(())
}
