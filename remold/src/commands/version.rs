/// Get the version string for remold and libremold
pub fn get_version_string() -> String {
    format!(
        "remold {}\nlibremold {}",
        env!("CARGO_PKG_VERSION"),
        libremold::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
