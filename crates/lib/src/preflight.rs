//! Host checks performed before starting a build.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fn_error_context::context;

/// The hardware virtualization device.
pub(crate) const KVM_DEVICE: &str = "/dev/kvm";

/// If set (to any value), we don't require KVM and the VM runs emulated.
pub(crate) const NO_KVM_ENV: &str = "OSBUILD_NO_KVM";

/// Whether the user asked to run without hardware virtualization.
pub(crate) fn kvm_bypassed() -> bool {
    std::env::var_os(NO_KVM_ENV).is_some()
}

/// Verifies that the VM can use hardware virtualization.
#[derive(Debug)]
pub(crate) struct Preflight {
    kvm_device: Utf8PathBuf,
    bypass: bool,
}

impl Preflight {
    /// Check the real KVM device, honoring `OSBUILD_NO_KVM`.
    pub(crate) fn from_env() -> Self {
        Self::new(KVM_DEVICE, kvm_bypassed())
    }

    pub(crate) fn new(kvm_device: impl Into<Utf8PathBuf>, bypass: bool) -> Self {
        Self {
            kvm_device: kvm_device.into(),
            bypass,
        }
    }

    #[context("Preflight check")]
    pub(crate) fn ensure_virtualization_available(&self) -> Result<()> {
        if self.bypass {
            tracing::debug!("{NO_KVM_ENV} is set, skipping check for {}", self.kvm_device);
            return Ok(());
        }
        stat_device(&self.kvm_device)
    }
}

fn stat_device(path: &Utf8Path) -> Result<()> {
    rustix::fs::stat(path.as_std_path()).with_context(|| {
        format!(
            "failed to access {path}; you can set {NO_KVM_ENV} to bypass this at the cost of performance"
        )
    })?;
    Ok(())
}
