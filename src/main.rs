use assignee_finder::utils::logger;
use assignee_finder::{Cli, FinderError, ReportEngine};
use clap::Parser;

fn fail(e: &FinderError) -> ! {
    tracing::error!("❌ {}", e);
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let mode = cli.command.mode();
    let args = cli.command.args();
    tracing::debug!("Command: {:?}", cli.command);

    let window = match cli.command.window(chrono::Utc::now().date_naive()) {
        Ok(window) => window,
        Err(e) => fail(&e),
    };

    let engine = match ReportEngine::from_config_file(&args.config) {
        Ok(engine) => engine,
        Err(e) => {
            if e.is_config_error() {
                eprintln!("❌ Failed to load config file '{}'", args.config.display());
            }
            fail(&e)
        }
    };

    let report = engine.run(mode, &window).await;
    if let Err(e) = report.write_to(&mut std::io::stdout().lock()) {
        fail(&e);
    }

    for failure in &report.failures {
        eprintln!("⚠️  {}", failure);
    }

    let exit_code = report.exit_code();
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
