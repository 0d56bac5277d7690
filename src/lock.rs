//! Single-instance lock
//!
//! A PID file created with `create_new` under the config directory. A
//! leftover file from a crashed run is reclaimed when its recorded process
//! is no longer alive. Held for the process lifetime; removed on drop.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Result};

pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        match Self::try_create(&path) {
            Ok(()) => Ok(Self { path }),
            Err(_) => {
                if Self::is_stale(&path) {
                    tracing::info!(path = %path.display(), "Reclaiming stale lock file");
                    let _ = fs::remove_file(&path);
                    Self::try_create(&path)?;
                    Ok(Self { path })
                } else {
                    bail!("another instance is already running");
                }
            }
        }
    }

    fn try_create(path: &PathBuf) -> Result<()> {
        use std::io::Write;
        let mut file = fs::File::options().write(true).create_new(true).open(path)?;
        write!(file, "{}", std::process::id())?;
        Ok(())
    }

    fn is_stale(path: &PathBuf) -> bool {
        let Ok(content) = fs::read_to_string(path) else {
            return true;
        };
        let Ok(pid) = content.trim().parse::<i32>() else {
            return true;
        };
        !Self::process_alive(pid)
    }

    #[cfg(unix)]
    fn process_alive(pid: i32) -> bool {
        // Signal 0 probes existence without delivering anything.
        unsafe { libc::kill(pid, 0) == 0 }
    }

    #[cfg(not(unix))]
    fn process_alive(_pid: i32) -> bool {
        true
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ymp.lock");

        let _lock = InstanceLock::acquire(path.clone()).unwrap();
        assert!(InstanceLock::acquire(path).is_err());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ymp.lock");

        drop(InstanceLock::acquire(path.clone()).unwrap());
        assert!(InstanceLock::acquire(path).is_ok());
    }

    #[test]
    fn stale_lock_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ymp.lock");
        // No live process has this PID on any reasonable system.
        fs::write(&path, "999999999").unwrap();

        assert!(InstanceLock::acquire(path).is_ok());
    }
}
