use std::path::Path;

use rollgrid_core::RolloutPolicy;

pub fn run(path: &str) -> anyhow::Result<()> {
    let policy = RolloutPolicy::from_file(Path::new(path))?;
    println!("✓ {path} is valid");
    print!("{}", policy.to_toml_string()?);
    Ok(())
}
