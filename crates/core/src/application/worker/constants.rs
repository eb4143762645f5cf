// Worker constants (No magic values)

/// Placeholder when a panic payload is neither `&str` nor `String`
pub const UNKNOWN_PANIC_MESSAGE: &str = "Unknown panic";
