use std::{
    collections::HashMap,
    env,
    ffi::{OsStr, OsString},
    mem,
    sync::{Mutex, MutexGuard, PoisonError},
};

use stader_basic_types::{Address, H256};

/// Serializes tests touching the same env variables and restores their previous values
/// once the [`EnvMutexGuard`] is dropped.
#[derive(Debug)]
pub(crate) struct EnvMutex(Mutex<()>);

impl EnvMutex {
    pub const fn new() -> Self {
        Self(Mutex::new(()))
    }

    pub fn lock(&self) -> EnvMutexGuard<'_> {
        let guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        EnvMutexGuard {
            _inner: guard,
            saved_vars: HashMap::new(),
        }
    }
}

#[must_use = "Environment will be reset when the guard is dropped"]
#[derive(Debug)]
pub(crate) struct EnvMutexGuard<'a> {
    _inner: MutexGuard<'a, ()>,
    saved_vars: HashMap<OsString, Option<OsString>>,
}

impl Drop for EnvMutexGuard<'_> {
    fn drop(&mut self) {
        for (name, value) in mem::take(&mut self.saved_vars) {
            match value {
                Some(value) => env::set_var(name, value),
                None => env::remove_var(name),
            }
        }
    }
}

impl EnvMutexGuard<'_> {
    fn save(&mut self, name: &OsStr) {
        if !self.saved_vars.contains_key(name) {
            self.saved_vars.insert(name.to_os_string(), env::var_os(name));
        }
    }

    /// Sets env vars specified in `.env`-like format.
    pub fn set_env(&mut self, fixture: &str) {
        for line in fixture.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let (name, value) = line
                .split_once('=')
                .unwrap_or_else(|| panic!("Incorrect line for setting environment variable: {line}"));
            let name = OsStr::new(name);
            self.save(name);
            env::set_var(name, value.trim_matches('"'));
        }
    }

    pub fn remove_env(&mut self, var_names: &[&str]) {
        for &name in var_names {
            let name = OsStr::new(name);
            self.save(name);
            env::remove_var(name);
        }
    }
}

pub fn addr(addr_str: &str) -> Address {
    addr_str.parse().expect("Incorrect address string")
}

pub fn hash(hash_str: &str) -> H256 {
    hash_str.parse().expect("Incorrect hash string")
}

#[test]
fn env_mutex_restores_variables() {
    const NEW_VAR: &str = "STADER_TEST_VARIABLE_THAT_IS_NOT_SET";
    const OVERRIDDEN_VAR: &str = "STADER_TEST_VARIABLE_THAT_IS_OVERRIDDEN";

    env::set_var(OVERRIDDEN_VAR, "initial");
    let mutex = EnvMutex::new();
    let mut lock = mutex.lock();
    lock.set_env(&format!("{NEW_VAR}=test\n{OVERRIDDEN_VAR}=\"changed\""));
    assert_eq!(env::var(NEW_VAR).unwrap(), "test");
    assert_eq!(env::var(OVERRIDDEN_VAR).unwrap(), "changed");
    lock.remove_env(&[OVERRIDDEN_VAR]);
    assert!(env::var_os(OVERRIDDEN_VAR).is_none());

    drop(lock);
    assert!(env::var_os(NEW_VAR).is_none());
    assert_eq!(env::var(OVERRIDDEN_VAR).unwrap(), "initial");
}
