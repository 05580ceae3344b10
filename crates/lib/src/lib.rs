//! # Build bootable disk images from bootc containers
//!
//! This crate drives a virtual machine to install a bootc container
//! image onto a qcow2 disk. The heavy lifting (booting the VM,
//! partitioning, running `bootc install`) happens in external helpers;
//! here we validate the host, write the build configuration they
//! consume, allocate the disk and invoke them.

mod build_config;
mod build_disk_impl;
pub mod cli;
mod helpers;
mod preflight;
mod qcow2;
mod qemuexec;

#[cfg(test)]
mod testutil;
