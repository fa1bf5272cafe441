use auction_scheduler::{cli::handle_command_line_args, config::SchedulerConfig, service::run_scheduler};
use dotenvy::dotenv;
use log::info;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = match SchedulerConfig::from_env_or_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    };
    info!("🚀️ Starting post auction scheduler with database {}", config.database_url);
    match run_scheduler(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    }
}
