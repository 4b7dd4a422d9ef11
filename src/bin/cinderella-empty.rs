use anyhow::Result;
use cinderella::{exit_code, init_logging, run, Settings, Variant};

fn main() -> Result<()> {
    init_logging()?;

    std::process::exit(exit_code(run(&Settings::default(), Variant::Empty)))
}
