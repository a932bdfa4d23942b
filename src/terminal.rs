//! Terminal detection for ANSI color output.

#[cfg(unix)]
mod unix {
    pub fn use_color() -> bool {
        unsafe {
            libc::isatty(/* stdout */ 1) == 1
        }
    }
}

#[cfg(unix)]
pub use unix::use_color;

#[cfg(not(unix))]
pub fn use_color() -> bool {
    false
}

/// Wrap `text` in the given ANSI escape code when color is enabled.
pub fn ansi(color: bool, code: &str, text: &str) -> String {
    if !color {
        return text.to_string();
    }
    format!("\x1b[{}m{}\x1b[0m", code, text)
}
