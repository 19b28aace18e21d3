//! Logger setup for the `storycode` binary.
//!
//! The library only emits `log` records; installing a logger is left to the
//! binary (or to any host application embedding the crate).

use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Install the global `env_logger` once.
///
/// `RUST_LOG` wins when set; otherwise the filter is `info`, or `debug` when
/// `verbose`. Later calls are no-ops.
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let default = if verbose { "debug" } else { "info" };
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default));
        builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
        let _ = builder.try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init(false);
        init(true);
        log::info!("logger initialized");
    }
}
