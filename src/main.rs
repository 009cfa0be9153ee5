use std::process;

use clap::Parser;
use dotenvy::dotenv;

mod cli;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = cli::Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
