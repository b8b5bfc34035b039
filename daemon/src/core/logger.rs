//! Logging setup: a `fern` dispatcher with colored level tags on stdout and
//! date-rotated files under `log_dir`, matching the crate's declared
//! `colored`/`date-based` feature set.

use std::path::Path;

use fern::colors::{Color, ColoredLevelConfig};

pub fn init(level: log::LevelFilter, log_dir: Option<&Path>) -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    let stdout = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    let mut dispatch = fern::Dispatch::new().chain(stdout);

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let file_dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{} {} {}] {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(level)
            .chain(fern::DateBased::new(dir.join("ledger_node."), "%Y-%m-%d.log"));
        dispatch = dispatch.chain(file_dispatch);
    }

    dispatch.apply()?;
    Ok(())
}
