use super::args::{Cli, Commands};
use super::context::ExecutionContext;
use super::handlers;
use super::logging;
use anyhow::Result;
use gamewatch_runtime::{config::expand_tilde, resolve_data_dir};

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let config_path = cli.config.as_deref().map(expand_tilde);
    let ctx = ExecutionContext::new(data_dir, config_path, cli.format);

    let Some(command) = cli.command else {
        return handlers::guidance::handle(&ctx);
    };

    match command {
        Commands::Init { force } => handlers::init::handle(&ctx, force),

        Commands::Run { duration, quiet } => handlers::run::handle(&ctx, duration, quiet),

        Commands::Probe {
            game,
            address,
            port,
            timeout_ms,
        } => handlers::probe::handle(&ctx, &game, &address, port, timeout_ms),

        Commands::Status => handlers::status::handle(&ctx),

        Commands::Sessions {
            server,
            player,
            open,
            limit,
        } => handlers::sessions::handle(&ctx, server, player, open, limit),

        Commands::History {
            server_id,
            hours,
            limit,
            csv,
        } => handlers::history::handle(&ctx, server_id, hours, limit, csv),

        Commands::Prune { days, vacuum } => handlers::history::prune(&ctx, days, vacuum),

        Commands::Games => handlers::games::handle(&ctx),
    }
}
