//! `shanghan serve`: Start the HTTP chat server.

use shanghan_config::AppConfig;
use tracing::warn;

pub async fn run(mut config: AppConfig, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Shang Han Lun chat server");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model);
    println!(
        "   API key:   {}",
        if config.has_api_key() { "configured" } else { "missing (fallback answers only)" }
    );
    println!("   Users:     {}", config.users.len());

    if !config.has_api_key() {
        warn!("DEEPSEEK_API_KEY not set; every answer will come from the fallback responder");
    }
    if config.users.is_empty() {
        warn!("No [[users]] configured; nobody can log in");
    }

    shanghan_gateway::start(config).await?;

    Ok(())
}
