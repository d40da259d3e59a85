use std::sync::Once;

static LOG_INIT: Once = Once::new();

/// Install env_logger, configured from `DSAGL_LOG` and `DSAGL_LOG_STYLE`
///
/// Later calls are ignored.
pub fn init() {
    LOG_INIT.call_once(|| {
        env_logger::init_from_env(
            env_logger::Env::new()
                .filter_or("DSAGL_LOG", "opengl=debug,dsagl=debug")
                .write_style("DSAGL_LOG_STYLE"),
        );
    });
}
