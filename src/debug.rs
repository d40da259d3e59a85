//! Forwarding of GL debug output to the `log` facade

use crate::gl as Gl;

fn debug_source(source: u32) -> &'static str {
    match source {
        Gl::DEBUG_SOURCE_API => "opengl::api",
        Gl::DEBUG_SOURCE_WINDOW_SYSTEM => "opengl::window_system",
        Gl::DEBUG_SOURCE_SHADER_COMPILER => "opengl::shader_compiler",
        Gl::DEBUG_SOURCE_THIRD_PARTY => "opengl::third_party",
        Gl::DEBUG_SOURCE_APPLICATION => "opengl::application",
        Gl::DEBUG_SOURCE_OTHER => "opengl::other",
        _ => "opengl::unknown",
    }
}

fn debug_level(severity: u32) -> log::Level {
    match severity {
        Gl::DEBUG_SEVERITY_HIGH => log::Level::Error,
        Gl::DEBUG_SEVERITY_MEDIUM => log::Level::Warn,
        Gl::DEBUG_SEVERITY_LOW => log::Level::Info,
        Gl::DEBUG_SEVERITY_NOTIFICATION => log::Level::Debug,
        _ => log::Level::Trace,
    }
}

fn debug_type(message_type: u32) -> &'static str {
    match message_type {
        Gl::DEBUG_TYPE_ERROR => "error",
        Gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated behavior",
        Gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined behavior",
        Gl::DEBUG_TYPE_PORTABILITY => "portability",
        Gl::DEBUG_TYPE_PERFORMANCE => "performance",
        Gl::DEBUG_TYPE_MARKER => "marker",
        Gl::DEBUG_TYPE_PUSH_GROUP => "push group",
        Gl::DEBUG_TYPE_POP_GROUP => "pop group",
        Gl::DEBUG_TYPE_OTHER => "other",
        _ => "unknown",
    }
}

fn log_message(source: u32, message_type: u32, id: u32, severity: u32, message: &str) {
    // Create record manually so we can override the module path
    log::logger().log(
        &log::Record::builder()
            .args(format_args!(
                "{} ({}): {}",
                debug_type(message_type),
                id,
                message
            ))
            .level(debug_level(severity))
            .target("opengl")
            .module_path_static(Some(debug_source(source)))
            .build(),
    );
}

/// Enable synchronous debug output on `gl` and log every message with the `opengl` target
///
/// Driver-side errors of the buffer wrappers (out of bounds writes, double immutable allocations,
/// ...) show up here without polling [`crate::check_error`]. glow only accepts one callback per
/// context, so this must be called once, before the context is shared.
pub fn install_debug_logger(gl: &mut crate::Context) {
    use glow::HasContext;

    unsafe {
        gl.enable(Gl::DEBUG_OUTPUT);
        gl.enable(Gl::DEBUG_OUTPUT_SYNCHRONOUS);
        gl.debug_message_callback(log_message);
    }

    log::debug!("installed GL debug message logger");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_maps_to_level() {
        assert_eq!(debug_level(Gl::DEBUG_SEVERITY_HIGH), log::Level::Error);
        assert_eq!(debug_level(Gl::DEBUG_SEVERITY_MEDIUM), log::Level::Warn);
        assert_eq!(debug_level(Gl::DEBUG_SEVERITY_LOW), log::Level::Info);
        assert_eq!(
            debug_level(Gl::DEBUG_SEVERITY_NOTIFICATION),
            log::Level::Debug
        );
        assert_eq!(debug_level(0), log::Level::Trace);
    }

    #[test]
    fn source_maps_to_module_path() {
        assert_eq!(debug_source(Gl::DEBUG_SOURCE_API), "opengl::api");
        assert_eq!(
            debug_source(Gl::DEBUG_SOURCE_SHADER_COMPILER),
            "opengl::shader_compiler"
        );
        assert_eq!(debug_source(0), "opengl::unknown");
    }

    #[test]
    fn message_type_names() {
        assert_eq!(debug_type(Gl::DEBUG_TYPE_ERROR), "error");
        assert_eq!(
            debug_type(Gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR),
            "undefined behavior"
        );
        assert_eq!(debug_type(0), "unknown");

        log_message(
            Gl::DEBUG_SOURCE_API,
            Gl::DEBUG_TYPE_ERROR,
            1281,
            Gl::DEBUG_SEVERITY_HIGH,
            "GL_INVALID_VALUE error generated",
        );
    }
}
