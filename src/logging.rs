//! Test-harness logger, colored by level; filtered by the `LOG` env var

use log::{Level, LevelFilter, Log, Metadata, Record};

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let color = match record.level() {
                Level::Error => 31,
                Level::Warn => 93,
                Level::Info => 34,
                Level::Debug => 32,
                Level::Trace => 90,
            };
            println!(
                "\u{1B}[{}m[{:>5}] {}\u{1B}[0m",
                color,
                record.level(),
                record.args()
            );
        }
    }
    fn flush(&self) {}
}

pub fn init() {
    static LOGGER: SimpleLogger = SimpleLogger;
    let _ = log::set_logger(&LOGGER).map(|()| {
        log::set_max_level(match option_env!("LOG") {
            Some(level) => match level {
                "ERROR" => LevelFilter::Error,
                "WARN" => LevelFilter::Warn,
                "INFO" => LevelFilter::Info,
                "DEBUG" => LevelFilter::Debug,
                "TRACE" => LevelFilter::Trace,
                _ => LevelFilter::Off,
            },
            None => LevelFilter::Off,
        });
    });
}
