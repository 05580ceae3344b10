//! Run QEMU in the foreground with a set of virtio disks attached.

use std::process::Command;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use osbuildbootc_utils::{CommandRunExt, Stdin};

use crate::preflight::{kvm_bypassed, NO_KVM_ENV};

/// Serial of the disk the installer writes to; the guest sees it
/// as `/dev/disk/by-id/virtio-target`.
const TARGET_SERIAL: &str = "target";

/// Options for running QEMU
#[derive(Debug, Parser, PartialEq, Eq)]
pub(crate) struct QemuExecOpts {
    /// Memory in MiB
    #[clap(long, short = 'm', default_value_t = 2048)]
    pub(crate) memory: u32,

    /// Number of virtual CPUs
    #[clap(long, default_value_t = 2)]
    pub(crate) cpus: u32,

    /// Attach a disk image (may be repeated)
    #[clap(long = "add-disk", short = 'd', action = clap::ArgAction::Append)]
    pub(crate) add_disk: Vec<Utf8PathBuf>,

    /// Attach the installation target disk
    #[clap(long)]
    pub(crate) add_target_disk: Option<Utf8PathBuf>,

    /// The QEMU binary
    #[clap(long, default_value = "qemu-kvm")]
    pub(crate) qemu: String,

    /// Additional arguments passed to QEMU verbatim
    #[clap(last = true)]
    pub(crate) args: Vec<String>,
}

/// Guess the image format from the file name; qemu refuses to autodetect raw images.
fn disk_format(path: &Utf8Path) -> &'static str {
    match path.extension() {
        Some("qcow2") => "qcow2",
        _ => "raw",
    }
}

fn push_disk(argv: &mut Vec<String>, id: &str, path: &Utf8Path, serial: &str) {
    let format = disk_format(path);
    argv.push("-drive".into());
    argv.push(format!("if=none,id={id},file={path},format={format}"));
    argv.push("-device".into());
    argv.push(format!("virtio-blk-pci,drive={id},serial={serial}"));
}

impl QemuExecOpts {
    /// Compute the QEMU arguments (not including the binary).
    pub(crate) fn qemu_args(&self, use_kvm: bool) -> Vec<String> {
        let mut argv: Vec<String> = vec!["-nographic".into()];
        if use_kvm {
            argv.extend(["-accel", "kvm", "-cpu", "host"].map(String::from));
        } else {
            argv.extend(["-accel", "tcg"].map(String::from));
        }
        argv.push("-m".into());
        argv.push(self.memory.to_string());
        argv.push("-smp".into());
        argv.push(self.cpus.to_string());
        for (i, disk) in self.add_disk.iter().enumerate() {
            let id = format!("disk{i}");
            push_disk(&mut argv, &id, disk, &id);
        }
        if let Some(target) = self.add_target_disk.as_ref() {
            push_disk(&mut argv, TARGET_SERIAL, target, TARGET_SERIAL);
        }
        argv.extend(self.args.iter().cloned());
        argv
    }
}

pub(crate) fn run(opts: &QemuExecOpts) -> Result<()> {
    let use_kvm = !kvm_bypassed();
    if !use_kvm {
        tracing::info!("{NO_KVM_ENV} is set; using software emulation");
    }
    Command::new(&opts.qemu)
        .args(opts.qemu_args(use_kvm))
        .run_sync(Stdin::Inherit)
}
