use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, info};
use traxovo_feed::{Config, DashboardService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting TRAXOVO feed");

    let config = Config::from_env()?;
    debug!("Loaded config: {:?}", config);

    let dashboard = Arc::new(DashboardService::new(&config));
    let refresher = config
        .refresh_interval
        .map(|every| dashboard.clone().spawn_refresh(every));

    print_help();

    let mut input = String::new();
    loop {
        input.clear();
        print!("> ");
        io::stdout().flush()?;
        if io::stdin().read_line(&mut input)? == 0 {
            debug!("Reached end of input");
            break;
        }

        match input.trim() {
            "" => {}
            "exit" | "quit" => {
                debug!("Received exit command");
                break;
            }
            "help" => print_help(),
            "assets" => println!("{}", dashboard.render_assets().await),
            "billing" => println!("{}", dashboard.render_billing().await),
            "summary" => println!("{}", dashboard.render_summary().await),
            "status" => println!("{}", dashboard.render_status()),
            other => println!("Unknown command: {} (try 'help')", other),
        }
    }

    if let Some(refresher) = refresher {
        refresher.abort();
    }

    info!("Shutting down");
    Ok(())
}

fn print_help() {
    println!("=== TRAXOVO Fleet Dashboard ===");
    println!("Commands:");
    println!("  assets   - Show fleet assets");
    println!("  billing  - Show billing records");
    println!("  summary  - Show headline metrics");
    println!("  status   - Show cache freshness per feed");
    println!("  exit     - Exit the program");
}
