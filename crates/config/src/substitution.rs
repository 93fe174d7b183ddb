use anyhow::Result;
use regex::Regex;
use std::env;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("placeholder pattern is valid"))
}

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for caps in placeholder_regex().captures_iter(content) {
        let Some(var_name) = caps.get(1).or(caps.get(2)).map(|m| m.as_str()) else {
            continue;
        };
        let placeholder = &caps[0];

        match env::var(var_name) {
            Ok(value) => {
                debug!("Substituting environment variable: {}", var_name);
                result = result.replace(placeholder, &value);
            }
            Err(_) => {
                warn!("Environment variable '{}' not set", var_name);
                // placeholder kept, reported by the validator
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        debug!("Unresolved environment variables: {:?}", missing_vars);
    }

    Ok(result)
}

/// Names of the placeholders still present in `content`
pub fn unresolved_env_vars(content: &str) -> Vec<String> {
    placeholder_regex()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).or(caps.get(2)).map(|m| m.as_str().to_string()))
        .collect()
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    placeholder_regex().is_match(content)
}
