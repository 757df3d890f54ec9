//! CLI argument validation functions
//!
//! Value parsers for arguments clap cannot check on its own. Errors are
//! plain strings; clap prefixes them with the argument name.

use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;

pub fn validate_port(port_str: &str) -> Result<u16, String> {
    let port: u16 = port_str.parse().map_err(|_| {
        format!(
            "Port must be a valid number between 1 and 65535, got: '{}'",
            port_str
        )
    })?;

    if port == 0 {
        return Err("Port must be between 1 and 65535. Port 0 is not allowed.".to_string());
    }

    Ok(port)
}

/// The file must exist, be a regular file and be readable.
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }
    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    fs::File::open(&path)
        .map(|_| path)
        .map_err(|e| format!("Cannot read configuration file '{}': {}", path_str, e))
}

/// Accepts IP addresses and host names. Dotted-digit strings must be valid
/// IPv4 addresses.
pub fn validate_host_address(host_str: &str) -> Result<String, String> {
    let host = host_str.trim();

    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }
    if host.contains(char::is_whitespace) {
        return Err("Host address cannot contain spaces".to_string());
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(format!("Invalid IPv4 address format: '{}'", host_str));
    }
    if host.len() > 253 {
        return Err("Host address is too long (maximum 253 characters)".to_string());
    }

    Ok(host.to_string())
}

/// The seed names a directory, so it must be one path component.
pub fn validate_network_seed(seed_str: &str) -> Result<String, String> {
    let seed = seed_str.trim();

    if seed.is_empty() {
        return Err("Network seed cannot be empty".to_string());
    }
    if seed == "." || seed == ".." || seed.contains(['/', '\\']) {
        return Err(format!(
            "Network seed '{}' must not contain path separators or be '.' or '..'",
            seed_str
        ));
    }

    Ok(seed.to_string())
}
