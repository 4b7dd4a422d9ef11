use anyhow::Result;
use cinderella::{exit_code, init_logging, run, Settings, Variant};

fn main() -> Result<()> {
    init_logging()?;

    let settings = Settings::default();
    let result = Variant::dated_default().and_then(|variant| run(&settings, variant));
    std::process::exit(exit_code(result))
}
