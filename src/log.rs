use slog::{o, Discard, Drain, Logger};
use slog_async::Async;
use slog_term::{FullFormat, TermDecorator};

pub fn create_logger(for_module: String) -> Logger {
    let decorator = TermDecorator::new().build();
    let drain = FullFormat::new(decorator)
        .use_utc_timestamp()
        .use_original_order()
        .build()
        .fuse();
    let async_drain = Async::new(drain).build().fuse();
    Logger::root(async_drain, o!("component" => "HRCore", "module" => for_module))
}

/// Swallows every record. Handy for embedding callers that log elsewhere, and for tests.
pub fn silent_logger() -> Logger {
    Logger::root(Discard, o!())
}
