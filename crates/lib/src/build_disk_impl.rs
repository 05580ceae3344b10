//! Install the source image onto the target disk.
//!
//! This runs inside the build VM, driven by `qcow2.sh`, and consumes the
//! configuration written by `build-qcow2`.

use std::process::Command;

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use osbuildbootc_utils::{CommandRunExt, Stdin};

use crate::build_config::BuildConfig;

/// Options for installing to the build VM's target disk
#[derive(Debug, Parser, PartialEq, Eq)]
pub(crate) struct BuildDiskImplOpts {
    /// Path to the build configuration
    pub(crate) config: Utf8PathBuf,

    /// The podman binary
    #[clap(long, default_value = "podman")]
    pub(crate) podman: String,
}

/// Arguments to podman to run `bootc install to-disk` from the source image.
fn install_args(config: &BuildConfig) -> Vec<String> {
    let mut argv: Vec<String> = [
        "run",
        "--rm",
        "--privileged",
        "--pid=host",
        "-v",
        "/dev:/dev",
        "-v",
        "/var/lib/containers:/var/lib/containers",
        "--security-opt",
        "label=type:unconfined_t",
    ]
    .map(String::from)
    .into();
    argv.push(config.source_imgref());
    argv.extend(["bootc", "install", "to-disk"].map(String::from));
    argv.extend(config.install_args.iter().cloned());
    argv.push(config.disk.clone());
    argv
}

pub(crate) fn run(opts: &BuildDiskImplOpts) -> Result<()> {
    let config = BuildConfig::load(&opts.config)?;
    tracing::info!(
        "Installing {} to {}",
        config.source_imgref(),
        config.disk
    );
    Command::new(&opts.podman)
        .args(install_args(&config))
        .run_sync(Stdin::Null)
}
