use std::io::Write;

use env_logger::{fmt::Formatter, Builder, Target};
use log::{Level, LevelFilter, SetLoggerError};

/// Installs a compact stderr logger at `level`. `RUST_LOG`, when set,
/// overrides it.
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .write_style(env_logger::WriteStyle::Never)
        .target(Target::Stderr)
        .format(|buf: &mut Formatter, record| {
            writeln!(buf, "{} {}", level_tag(record.level()), record.args())
        });
    builder.try_init()
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(Level::Warn), "WARN");
        assert_eq!(level_tag(Level::Trace), "TRACE");
    }
}
