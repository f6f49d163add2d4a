//! Serialises environment mutation in binary tests.

use std::env;

use tokio::sync::{Mutex, MutexGuard};

pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Holds the env mutex and removes the variables it set on drop.
pub struct EnvGuard {
    keys: Vec<String>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets each variable while holding the global mutex.
    pub async fn set_vars(vars: &[(&str, &str)]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut keys = Vec::with_capacity(vars.len());
        for (key, value) in vars {
            unsafe { env::set_var(key, value) };
            keys.push((*key).to_owned());
        }
        Self {
            keys,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            unsafe { env::remove_var(key) };
        }
    }
}
