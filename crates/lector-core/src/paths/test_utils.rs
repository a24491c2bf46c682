//! Environment isolation for path tests.

use std::env;
use std::sync::Mutex;

/// Held by every test that reads or writes `LECTOR_*` variables.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Restores one environment variable when dropped.
pub struct EnvVarGuard {
    key: String,
    previous: Option<String>,
}

impl EnvVarGuard {
    pub fn set(key: &str, value: &str) -> Self {
        Self::replace(key, Some(value))
    }

    pub fn unset(key: &str) -> Self {
        Self::replace(key, None)
    }

    fn replace(key: &str, value: Option<&str>) -> Self {
        let previous = env::var(key).ok();
        write(key, value);
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

#[allow(unsafe_code)]
fn write(key: &str, value: Option<&str>) {
    // SAFETY: callers hold ENV_LOCK, so no other test touches the environment.
    unsafe {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        write(&self.key, self.previous.as_deref());
    }
}
