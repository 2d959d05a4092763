//! Startup failures and their process exit codes

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::ui::surface::SurfaceError;
use crate::ui::UiInitError;

/// Fatal conditions that stop the program before the render loop starts.
///
/// Every variant maps to its own exit code so a supervisor can tell them apart.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open {}: {source}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("get screen info failed: {0}")]
    DeviceInfo(#[from] DeviceInfoError),

    #[error("failed to map framebuffer: {0}")]
    MemoryMap(#[source] io::Error),

    #[error("failed to init rawfb: {0}")]
    UiInit(#[from] UiInitError),

    #[error("failed to decode embedded asset: {0}")]
    Asset(#[source] anyhow::Error),
}

/// Why the geometry query was unusable.
#[derive(Debug, Error)]
pub enum DeviceInfoError {
    #[error("{0}")]
    Query(#[from] io::Error),

    #[error("{0}")]
    Geometry(#[from] SurfaceError),
}

impl StartupError {
    /// Process exit status for this failure (negative errno).
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::DeviceOpen { .. } => -libc::ENODEV,
            StartupError::DeviceInfo(_) => -libc::EFAULT,
            StartupError::MemoryMap(_) => -libc::EBADF,
            StartupError::UiInit(_) => -libc::ENOMEM,
            StartupError::Asset(_) => -libc::EINVAL,
        }
    }
}

/// Exit code for an error chain: the first `StartupError` decides, anything else is 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StartupError>())
        .map_or(1, StartupError::exit_code)
}
