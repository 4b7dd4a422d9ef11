use cinderella::{exit_code, run, Settings, Variant, DEFAULT_OUTPUT};
use std::path::Path;

fn settings_in(dir: &Path) -> Settings {
    Settings::builder().output(dir.join("gg")).build()
}

#[test]
fn default_output_is_tmp_gg() {
    assert_eq!(Settings::default().output, Path::new(DEFAULT_OUTPUT));
    assert_eq!(DEFAULT_OUTPUT, "/tmp/gg");
}

#[test]
fn empty_variant_writes_empty_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = settings_in(dir.path());

    run(&settings, Variant::Empty)?;

    assert_eq!(std::fs::read_to_string(&settings.output)?, "");
    Ok(())
}

#[test]
fn dated_variant_writes_one_directive() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = settings_in(dir.path());

    run(&settings, Variant::dated_default()?)?;

    let written = std::fs::read_to_string(&settings.output)?;
    assert_eq!(written.matches("2022-12-01").count(), 1);
    assert_eq!(written, "; 2022-12-01\n\n");
    Ok(())
}

#[test]
fn rerun_overwrites_previous_output() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = settings_in(dir.path());

    run(&settings, Variant::dated_default()?)?;
    run(&settings, Variant::Empty)?;

    assert_eq!(std::fs::read_to_string(&settings.output)?, "");
    Ok(())
}

#[test]
fn unwritable_output_is_reported() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let settings = Settings::builder()
        .output(dir.path().join("missing").join("gg"))
        .build();

    let err = run(&settings, Variant::Empty).unwrap_err();

    assert!(format!("{:#}", err).contains("failed to write ledger"));
    Ok(())
}

#[test]
fn failed_run_exits_non_zero() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let unwritable = Settings::builder()
        .output(dir.path().join("missing").join("gg"))
        .build();

    assert_eq!(exit_code(run(&unwritable, Variant::Empty)), 1);
    assert_eq!(exit_code(run(&settings_in(dir.path()), Variant::Empty)), 0);
    Ok(())
}
