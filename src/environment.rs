use std::env;

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `delimiter`: The character to split the environment variable's value by.
///
/// # Returns
/// - `Vec<String>`, empty when the variable is unset or blank.
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    let value = env::var(var).unwrap_or_default();
    if value.trim().is_empty() {
        return Vec::new();
    }
    value
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .collect()
}

/// Retrieves an environment variable, treating unset and blank values alike.
pub fn get_env_var_opt(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a port from `PORT`, falling back to `default`.
pub fn get_port(default: u16) -> u16 {
    get_env_var_opt("PORT")
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(default)
}
