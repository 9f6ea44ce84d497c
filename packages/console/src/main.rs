use clap::Parser;

use lambda_view_console::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    lambda_view_console::init_tracing();

    if let Err(e) = lambda_view_console::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
