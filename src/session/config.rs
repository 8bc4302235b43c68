use std::env;
use std::ffi::OsString;

use tracing::warn;

pub const RESUME_EPSILON_ENV: &str = "PODCAST_RESUME_EPSILON_SECS";
const DEFAULT_RESUME_EPSILON_SECS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Saved positions this close to the end count as finished and are not
    /// resumed.
    pub resume_epsilon_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resume_epsilon_secs: DEFAULT_RESUME_EPSILON_SECS,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        Self::from_env_value(env::var_os(RESUME_EPSILON_ENV))
    }

    pub(crate) fn from_env_value(value: Option<OsString>) -> Self {
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            return Self::default();
        };
        match value.to_string_lossy().trim().parse::<f64>() {
            Ok(epsilon) if epsilon.is_finite() && epsilon >= 0.0 => Self {
                resume_epsilon_secs: epsilon,
            },
            _ => {
                warn!(
                    value = %value.to_string_lossy(),
                    "ignoring invalid {RESUME_EPSILON_ENV}"
                );
                Self::default()
            }
        }
    }
}
