use super::Context;
use studymem_core::Config;

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let config_path = ctx.paths.config_path();
    std::fs::create_dir_all(ctx.paths.data_dir())?;

    if config_path.exists() {
        println!("Config already present at {}", config_path.display());
        return Ok(());
    }

    let json = serde_json::to_string_pretty(&Config::new())?;
    studymem_sessions::atomic_write(&config_path, json.as_bytes())?;

    println!("✓ Initialized studymem in {}", ctx.paths.data_dir().display());
    println!("  config:   {}", config_path.display());
    println!("  database: {}", ctx.paths.db_path().display());
    Ok(())
}
