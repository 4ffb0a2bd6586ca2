use std::{
    fs::{File, OpenOptions},
    path::PathBuf,
};

use fs2::FileExt;

use crate::infra::{error::AppError, storage_layout::StorageLayout};

/// Exclusive hold on the session directory; released when dropped.
#[derive(Debug)]
pub struct SessionLockGuard {
    path: PathBuf,
    file: File,
}

impl SessionLockGuard {
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for SessionLockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

pub struct StartupPlan {
    pub layout: StorageLayout,
    pub lock_guard: SessionLockGuard,
}

pub fn plan_startup() -> Result<StartupPlan, AppError> {
    plan_startup_in(StorageLayout::resolve()?)
}

pub fn plan_startup_in(layout: StorageLayout) -> Result<StartupPlan, AppError> {
    layout.ensure_dirs()?;
    let lock_guard = acquire_session_lock(layout.session_lock_file())?;

    tracing::debug!(lock = %lock_guard.path().display(), "session store locked");

    Ok(StartupPlan { layout, lock_guard })
}

fn acquire_session_lock(path: PathBuf) -> Result<SessionLockGuard, AppError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .map_err(|source| AppError::SessionLockCreate {
            path: path.clone(),
            source,
        })?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(SessionLockGuard { path, file }),
        Err(source) if source.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(AppError::SessionStoreBusy { path })
        }
        Err(source) => Err(AppError::SessionLockCreate { path, source }),
    }
}
