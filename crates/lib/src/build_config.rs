//! The build configuration handed to the disk image helpers.
//!
//! This is written to `tmp/config.json` and read back inside the build
//! VM by `build-disk-impl`. The field names and the disk path are a
//! contract with the helper scripts.

use std::fs::{DirBuilder, File, OpenOptions, Permissions};
use std::io::{BufReader, Write as _};
use std::os::unix::fs::{DirBuilderExt as _, OpenOptionsExt as _, PermissionsExt as _};

use anyhow::{ensure, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fn_error_context::context;
use serde::{Deserialize, Serialize};

use crate::cli::BuildQcow2Opts;

/// Scratch directory, relative to the working directory.
pub(crate) const TMPDIR: &str = "tmp";
/// Location of the serialized configuration, relative to the working directory.
pub(crate) const CONFIG_PATH: &str = "tmp/config.json";
/// The target disk as seen from inside the build VM.
pub(crate) const TARGET_DISK: &str = "/dev/disk/by-id/virtio-target";

/// Disable signature verification when the installed system pulls updates.
const ARG_NO_SIGNATURE_VERIFICATION: &str = "--target-no-signature-verification";
/// Skip verifying that the target image can be fetched.
const ARG_SKIP_FETCH_CHECK: &str = "--skip-fetch-check";

/// Everything the build VM needs to install the source image.
///
/// Serialized with the fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub(crate) struct BuildConfig {
    /// e.g. `docker://` or `containers-storage:`
    pub(crate) source_transport: String,
    /// The container image to install; never empty.
    pub(crate) source: String,
    /// Passed to `bootc install to-disk`; order matters.
    pub(crate) install_args: Vec<String>,
    /// The block device to install to, always [`TARGET_DISK`].
    pub(crate) disk: String,
}

/// The installer arguments; `--target-imgref` is always last.
fn install_args(opts: &BuildQcow2Opts) -> Vec<String> {
    let mut args = Vec::new();
    if opts.target_no_signature_verification {
        args.push(ARG_NO_SIGNATURE_VERIFICATION.to_owned());
    }
    if opts.skip_fetch_check {
        args.push(ARG_SKIP_FETCH_CHECK.to_owned());
    }
    args.push(format!("--target-imgref={}", opts.target_image()));
    args
}

impl BuildConfig {
    pub(crate) fn new(opts: &BuildQcow2Opts) -> Self {
        Self {
            source_transport: opts.transport.clone(),
            source: opts.source.clone(),
            install_args: install_args(opts),
            disk: TARGET_DISK.to_owned(),
        }
    }

    /// Serialize to `tmp/config.json` under `workdir`, replacing any
    /// previous content. Returns the path written.
    ///
    /// An empty `workdir` means the current directory, in which case the
    /// returned path is the relative `tmp/config.json`.
    #[context("Writing build configuration")]
    pub(crate) fn write(&self, workdir: &Utf8Path) -> Result<Utf8PathBuf> {
        let tmpdir = workdir.join(TMPDIR);
        DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(&tmpdir)
            .with_context(|| format!("Creating {tmpdir}"))?;

        let buf = serde_json::to_vec(self)?;
        let path = workdir.join(CONFIG_PATH);
        let mut f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(&path)
            .with_context(|| format!("Opening {path}"))?;
        // An existing file keeps its mode on open, so set it explicitly
        f.set_permissions(Permissions::from_mode(0o644))
            .with_context(|| format!("Setting permissions on {path}"))?;
        f.write_all(&buf)
            .and_then(|_| f.flush())
            .with_context(|| format!("Writing {path}"))?;
        Ok(path)
    }

    #[context("Loading build configuration from {path}")]
    pub(crate) fn load(path: &Utf8Path) -> Result<Self> {
        let f = File::open(path).map(BufReader::new)?;
        let config: Self = serde_json::from_reader(f)?;
        ensure!(!config.source.is_empty(), "Missing source image");
        Ok(config)
    }

    /// The image reference as understood by podman.
    ///
    /// The transport is prepended unless the source already carries it.
    pub(crate) fn source_imgref(&self) -> String {
        if self.source.starts_with(&self.source_transport) {
            self.source.clone()
        } else {
            format!("{}{}", self.source_transport, self.source)
        }
    }
}
