//! Shared test helpers for running stand-in helper programs.

use std::os::unix::fs::PermissionsExt as _;
use std::sync::{Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};

static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests which write and then execute scripts; a concurrent
/// fork() can otherwise hold our write fd open and cause ETXTBSY.
pub(crate) fn spawn_lock() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// A scratch directory with a UTF-8 path.
pub(crate) fn tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let td = tempfile::tempdir().unwrap();
    let p = Utf8Path::from_path(td.path()).unwrap().to_owned();
    (td, p)
}

/// Write an executable shell script.
pub(crate) fn write_script(dir: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
