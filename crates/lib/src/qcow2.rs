//! Generate a qcow2 disk image from a bootc container image.

use std::process::Command;

use anyhow::Result;
use camino::Utf8Path;
use fn_error_context::context;
use osbuildbootc_utils::{CommandRunExt, Stdin};

use crate::build_config::BuildConfig;
use crate::cli::BuildQcow2Opts;
use crate::helpers::Helpers;
use crate::preflight::Preflight;

/// Create an empty sparse qcow2 of `size_mib` MiB at `dest`.
#[context("Allocating {dest}")]
pub(crate) fn preallocate(qemu_img: &Utf8Path, dest: &Utf8Path, size_mib: u64) -> Result<()> {
    Command::new(qemu_img)
        .args(["create", "-f", "qcow2"])
        .arg(dest)
        .arg(format!("{size_mib}M"))
        .run_sync(Stdin::Null)
}

/// Build `opts.dest` from `opts.source`.
///
/// The build configuration is written beneath `workdir`; an empty path
/// means the current directory. If the install helper fails the partially
/// written disk is removed.
pub(crate) fn build_qcow2(
    opts: &BuildQcow2Opts,
    workdir: &Utf8Path,
    preflight: &Preflight,
    helpers: &Helpers,
) -> Result<()> {
    preflight.ensure_virtualization_available()?;

    let config = BuildConfig::new(opts);
    let config_path = config.write(workdir)?;

    preallocate(&helpers.qemu_img, &opts.dest, opts.size)?;

    tracing::info!(
        "Generating image; source={} target={}",
        config.source,
        opts.target_image()
    );
    let r = Command::new(&helpers.qcow2)
        .arg(&opts.dest)
        .arg(&config_path)
        .run_sync(Stdin::Null);
    if r.is_err() {
        // Best effort; the helper's error is what matters
        if let Err(e) = std::fs::remove_file(&opts.dest) {
            tracing::debug!("Failed to remove {}: {e}", opts.dest);
        }
    }
    r
}
