//! External programs we hand the real work to.

use std::process::Command;

use anyhow::Result;
use camino::Utf8PathBuf;
use osbuildbootc_utils::{CommandRunExt, Stdin};

/// Where the helper scripts are installed.
const LIBEXECDIR: &str = "/usr/lib/osbuildbootc";

#[derive(Debug)]
pub(crate) struct Helpers {
    /// Used to allocate the target disk
    pub(crate) qemu_img: Utf8PathBuf,
    /// Boots the build VM and installs into the target disk
    pub(crate) qcow2: Utf8PathBuf,
    /// Boots the build VM with an interactive shell
    pub(crate) vmshell: Utf8PathBuf,
}

impl Default for Helpers {
    fn default() -> Self {
        let libexec = Utf8PathBuf::from(LIBEXECDIR);
        Self {
            qemu_img: "qemu-img".into(),
            qcow2: libexec.join("qcow2.sh"),
            vmshell: libexec.join("vmshell.sh"),
        }
    }
}

impl Helpers {
    /// Run a shell in the build VM, attached to our terminal.
    pub(crate) fn run_vmshell(&self) -> Result<()> {
        Command::new(&self.vmshell).run_sync(Stdin::Inherit)
    }
}
