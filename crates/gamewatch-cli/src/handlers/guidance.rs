use crate::context::ExecutionContext;
use anyhow::Result;

/// Shown when `gamewatch` is invoked without a command.
pub fn handle(ctx: &ExecutionContext) -> Result<()> {
    println!("gamewatch polls game servers and records who is playing.\n");

    if !ctx.config_path().exists() {
        println!("No config found at {}.", ctx.config_path().display());
        println!("Start with:\n  gamewatch init");
        return Ok(());
    }

    let servers = ctx.config()?.servers.len();
    println!("Config: {} ({} servers)", ctx.config_path().display(), servers);
    println!("\nNext:");
    println!("  gamewatch run        poll until Ctrl-C");
    println!("  gamewatch status     latest status per server");
    println!("  gamewatch sessions   who played and for how long");
    println!("  gamewatch --help     everything else");
    Ok(())
}
