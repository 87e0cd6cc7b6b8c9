use std::time::Instant;
use tracing::{error, info, info_span};

use tracing_log_fanout::{init_global, Config, Level};

fn main() {
    let config = Config {
        level: Level::Info,
        file_output: true,
        file_path: Some(std::env::temp_dir().join("tracing-log-fanout").join("demo.log")),
        ..Config::default()
    };

    let (_logger, guard) = match init_global(config) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    let n: u64 = 1_000;
    let start = Instant::now();

    let span = info_span!("job", name = "load");
    let _entered = span.enter();
    for i in 0..n {
        if i % 250 == 0 {
            error!(iteration = i, "periodic failure");
        } else {
            info!(iteration = i, "tick");
        }
    }

    let elapsed = start.elapsed();
    println!(
        "sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    if let Err(e) = guard.close() {
        eprintln!("failed to close log file: {e}");
    }
}
