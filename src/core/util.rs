//! Common utilities

use xxhash_rust::xxh3::xxh3_64;

/// Fingerprint a schema (or any bytes) for logs and status output
pub fn fingerprint(data: &[u8]) -> String {
    format!("{:016x}", xxh3_64(data))
}

/// Check if a command is available in PATH
pub fn command_exists(cmd: &str) -> bool {
    std::process::Command::new("which")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
