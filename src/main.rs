use std::time::Duration;

use colored::Colorize;

use autologin::{app, AppPaths, Console};

#[tokio::main]
async fn main() {
    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let paths = AppPaths::resolve();

    let code = tokio::select! {
        result = app::run(paths) => match result {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("\n{} {:#}", "ERROR:".red().bold(), e);
                let _ = tokio::task::spawn_blocking(|| {
                    let mut console = Console::stdio();
                    console.wait_for_enter("Press Enter to exit...")
                })
                .await;
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n{}", "Interrupted. Goodbye.".yellow());
            // Give the browser shutdown spawned on drop a moment to land.
            tokio::time::sleep(Duration::from_millis(400)).await;
            130
        }
    };

    std::process::exit(code);
}
