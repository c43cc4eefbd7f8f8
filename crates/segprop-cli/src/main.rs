use clap::Parser as _;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    segprop_cli::setup_logging();
    let args = segprop_cli::Args::parse();
    segprop_cli::run(&args)?;
    Ok(())
}
