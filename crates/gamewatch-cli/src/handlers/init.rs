use crate::context::ExecutionContext;
use anyhow::Result;
use gamewatch_runtime::Config;

/// Write the starter config (unless one exists and `force` is off) and create
/// the database schema.
pub fn handle(ctx: &ExecutionContext, force: bool) -> Result<()> {
    let config_path = ctx.config_path();
    let existed = config_path.exists();

    let config_written = if existed && !force {
        false
    } else {
        Config::example().save_to(config_path)?;
        true
    };

    ctx.db()?;
    let servers = ctx.config()?.servers.len();

    if ctx.is_json() {
        let out = serde_json::json!({
            "config_path": config_path,
            "config_written": config_written,
            "db_path": ctx.db_path(),
            "servers": servers,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if config_written {
        println!("Wrote {}", config_path.display());
    } else {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }
    println!("Database ready at {}", ctx.db_path().display());
    println!("{} servers configured. Edit the config, then run `gamewatch run`.", servers);
    Ok(())
}
