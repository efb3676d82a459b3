pub(crate) use anyhow::Error;

pub type Result<T = (), E = Error> = core::result::Result<T, E>;

/// Prints a warning. By using our own function for this, it'll be easier to find places that issue
/// warnings if we ever want a flag to suppress them. Duplicate-symbol diagnostics and
/// undefined-symbol diagnostics with `-undefined warning` semantics go through here; everything
/// that must stop the link is returned as an `Error` instead.
pub(crate) fn warning(message: &str) {
    println!("WARNING: machlink: {message}");
}
