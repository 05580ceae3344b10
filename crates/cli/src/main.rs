//! The main entrypoint for osbuildbootc, which is the crate
//! osbuildbootc-lib; this is a thin wrapper.

use anyhow::Result;

fn run() -> Result<()> {
    osbuildbootc_utils::initialize_tracing();
    tracing::trace!("starting {}", osbuildbootc_utils::NAME);
    osbuildbootc_lib::cli::run_from_iter(std::env::args_os())
}

fn main() {
    osbuildbootc_utils::run_main(run)
}
