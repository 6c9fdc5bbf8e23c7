//! Compose Upgrade Agent
//!
//! Usage:
//! - Normal mode: `compose-upgrade-agent`
//! - With custom port: `compose-upgrade-agent --port 5100`

use compose_upgrade_agent::RuntimeConfig;

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("Compose Upgrade Agent - install, upgrade and start docker compose deployments");
    println!();
    println!("USAGE:");
    println!("    compose-upgrade-agent [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port (default: $PORT or 5008)");
    println!("    -h, --help       Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    CHT_COMPOSE_PROJECT_NAME    Project name passed to compose with -p");
    println!("    CHT_BACKUP_COMPOSE_FILES    Back up compose files before overwrite (default: true)");
    println!("    CHT_COMPOSE_DIR             Compose file directory (default: /docker-compose)");
    println!("    CHT_BACKUP_DIR              Backup root directory (default: data/backup)");
    println!("    CHT_COMPOSE_CLI             Compose command line, e.g. \"docker compose\"");
    println!("    RUST_LOG                    Log filter (default: info)");
}

#[tokio::main]
async fn main() {
    let config = parse_args();

    if let Err(e) = compose_upgrade_agent::run_agent(config).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
