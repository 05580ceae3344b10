//! # osbuildbootc CLI
//!
//! Command line tool to generate disk images from bootc containers.

use std::ffi::OsString;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::builder::NonEmptyStringValueParser;
use clap::error::ErrorKind;
use clap::Parser;
use osbuildbootc_utils::UsageError;

use crate::build_disk_impl::BuildDiskImplOpts;
use crate::helpers::Helpers;
use crate::preflight::Preflight;
use crate::qemuexec::QemuExecOpts;

/// Options for generating a qcow2 disk image
#[derive(Debug, Parser, PartialEq, Eq)]
pub(crate) struct BuildQcow2Opts {
    /// Source image transport
    #[clap(long = "transport", default_value = "docker://")]
    pub(crate) transport: String,

    /// Disk size in MiB
    #[clap(long, default_value_t = 10 * 1024)]
    pub(crate) size: u64,

    /// Target image (e.g. quay.io/exampleuser/someimg:latest); defaults to the source
    #[clap(long, short = 't', default_value = "")]
    pub(crate) target: String,

    /// Disable signature verification for target
    #[clap(long, short = 'I')]
    pub(crate) target_no_signature_verification: bool,

    /// Skip verification of target image
    #[clap(long, short = 'S')]
    pub(crate) skip_fetch_check: bool,

    /// Source container image
    #[clap(value_parser = NonEmptyStringValueParser::new())]
    pub(crate) source: String,

    /// Path to the disk image to write
    pub(crate) dest: Utf8PathBuf,
}

impl BuildQcow2Opts {
    /// The image the installed system will track for updates.
    pub(crate) fn target_image(&self) -> &str {
        if self.target.is_empty() {
            &self.source
        } else {
            &self.target
        }
    }
}

/// Generate bootable disk images from bootc container images.
#[derive(Debug, Parser, PartialEq, Eq)]
#[clap(name = "osbuildbootc")]
#[clap(rename_all = "kebab-case")]
#[clap(version)]
pub(crate) enum Opt {
    /// Generate a qcow2 from a bootc image
    #[clap(name = "build-qcow2")]
    BuildQcow2(BuildQcow2Opts),
    /// Run a shell in the build VM
    #[clap(name = "vmshell")]
    VmShell,
    /// Run QEMU with the host's terminal attached
    #[clap(name = "qemuexec")]
    QemuExec(QemuExecOpts),
    /// Install a bootc image to disk; runs inside the build VM
    #[clap(name = "build-disk-impl")]
    BuildDiskImpl(BuildDiskImplOpts),
}

/// Parse the provided arguments and execute.
///
/// Invalid arguments print the usage message and return
/// [`UsageError`]; `--help` and `--version` print and succeed.
pub fn run_from_iter<I>(args: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    match parse_opt(args)? {
        Some(opt) => run_from_opt(opt),
        None => Ok(()),
    }
}

/// Returns `None` if help or version output was requested and printed.
fn parse_opt<I>(args: I) -> Result<Option<Opt>>
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
{
    match Opt::try_parse_from(args) {
        Ok(opt) => Ok(Some(opt)),
        Err(e) => {
            // Don't panic if writing fails.
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Ok(None),
                _ => Err(UsageError.into()),
            }
        }
    }
}

fn run_from_opt(opt: Opt) -> Result<()> {
    match opt {
        Opt::BuildQcow2(opts) => crate::qcow2::build_qcow2(
            &opts,
            // Relative to the current directory
            Utf8Path::new(""),
            &Preflight::from_env(),
            &Helpers::default(),
        ),
        Opt::VmShell => Helpers::default().run_vmshell(),
        Opt::QemuExec(opts) => crate::qemuexec::run(&opts),
        Opt::BuildDiskImpl(opts) => crate::build_disk_impl::run(&opts),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_parse_build_qcow2() {
        let o = Opt::try_parse_from([
            "osbuildbootc",
            "build-qcow2",
            "docker://a:1",
            "out.qcow2",
            "-I",
            "-S",
            "-t",
            "quay.io/b:2",
        ])
        .unwrap();
        similar_asserts::assert_eq!(
            o,
            Opt::BuildQcow2(BuildQcow2Opts {
                transport: "docker://".into(),
                size: 10240,
                target: "quay.io/b:2".into(),
                target_no_signature_verification: true,
                skip_fetch_check: true,
                source: "docker://a:1".into(),
                dest: "out.qcow2".into(),
            })
        );
    }

    #[test]
    fn test_parse_build_qcow2_defaults() {
        let o = Opt::try_parse_from([
            "osbuildbootc",
            "build-qcow2",
            "--transport",
            "containers-storage:",
            "--size=2048",
            "localhost/os",
            "out.qcow2",
        ])
        .unwrap();
        let Opt::BuildQcow2(opts) = o else {
            panic!("Unexpected {o:?}")
        };
        assert_eq!(opts.transport, "containers-storage:");
        assert_eq!(opts.size, 2048);
        assert_eq!(opts.target_image(), "localhost/os");
        assert!(!opts.target_no_signature_verification);
        assert!(!opts.skip_fetch_check);
    }

    #[test]
    fn test_usage_exit_code() {
        for args in [
            &["osbuildbootc", "frobnicate"][..],
            &["osbuildbootc", "build-qcow2", "onlyone"],
            &["osbuildbootc", "build-qcow2", "a", "b", "--size", "ten"],
            &["osbuildbootc", "vmshell", "extra"],
        ] {
            let e = parse_opt(args).unwrap_err();
            assert!(e.downcast_ref::<UsageError>().is_some(), "{args:?}");
            assert_eq!(osbuildbootc_utils::exit_code_for(&e), 1, "{args:?}");
            assert_eq!(osbuildbootc_utils::error_message(&e), None);
        }
        // Nothing is run for invalid usage
        let e = run_from_iter(["osbuildbootc", "build-qcow2", "onlyone"]).unwrap_err();
        assert_eq!(osbuildbootc_utils::exit_code_for(&e), 1);
    }

    #[test]
    fn test_help_and_version() {
        assert!(parse_opt(["osbuildbootc", "--help"]).unwrap().is_none());
        assert!(parse_opt(["osbuildbootc", "build-qcow2", "--help"])
            .unwrap()
            .is_none());
        assert!(parse_opt(["osbuildbootc", "--version"]).unwrap().is_none());
        run_from_iter(["osbuildbootc", "--help"]).unwrap();
    }

    #[test]
    fn test_usage_errors() {
        for args in [
            &["osbuildbootc", "build-qcow2", "docker://a:1"][..],
            &["osbuildbootc", "build-qcow2", "a", "b", "c"],
            &["osbuildbootc", "build-qcow2", "", "out.qcow2"],
            &["osbuildbootc", "build-qcow2", "a", "b", "--size", "-1"],
            &["osbuildbootc", "build-qcow2", "a", "b", "--size", "ten"],
            &["osbuildbootc", "vmshell", "extra"],
            &["osbuildbootc", "frobnicate"],
            &["osbuildbootc"],
        ] {
            assert!(Opt::try_parse_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn test_parse_vmshell() {
        let o = Opt::try_parse_from(["osbuildbootc", "vmshell"]).unwrap();
        assert_eq!(o, Opt::VmShell);
    }

    #[test]
    fn test_help_lists_commands() {
        let help = Opt::command().render_help().to_string();
        for cmd in ["build-qcow2", "vmshell", "qemuexec", "build-disk-impl"] {
            assert!(help.contains(cmd), "{cmd} missing from {help}");
        }
    }

    #[test]
    fn test_cli_debug_assert() {
        Opt::command().debug_assert();
    }
}
