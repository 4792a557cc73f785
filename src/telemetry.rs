use std::{env, fs::File, sync::Once};

use tracing::Level;

/// JSON logs for the standalone stub: to the file named by `LOG_PATH`, or to
/// stdout when it is unset.
pub fn init_json_logging() -> std::io::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .with_ansi(false)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true);

    match env::var("LOG_PATH") {
        Ok(path) => builder.with_writer(File::create(path)?).init(),
        Err(_) => builder.init(),
    }

    Ok(())
}

static TEST_LOGGING: Once = Once::new();

/// Installs a compact subscriber that writes through the test harness
/// capture. Safe to call from every test.
pub fn init_test_logging() {
    TEST_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .compact()
            .with_test_writer()
            .try_init();
    });
}
