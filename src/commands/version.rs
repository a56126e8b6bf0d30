//! Command: print version information.

/// Version string: `PAM_LIMITS_VERSION` from the build, or the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("PAM_LIMITS_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the pam-limits version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("pam-limits {}", version());
}
