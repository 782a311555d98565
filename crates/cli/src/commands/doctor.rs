//! `shanghan doctor`: Diagnose configuration and connectivity.

use std::path::Path;

use shanghan_config::AppConfig;
use shanghan_providers::{DeepSeekClient, mask_key, test_connection};
use shanghan_security::StaticCredentialStore;

pub async fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Shang Han Lun chat service: diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = path.map(Path::to_path_buf).unwrap_or_else(AppConfig::default_path);
    if config_path.exists() {
        println!("  [ok]   Config file: {}", config_path.display());
    } else {
        println!("  [warn] No config file at {}; using defaults (run `shanghan init`)", config_path.display());
        issues += 1;
    }

    let config = match AppConfig::load(path) {
        Ok(config) => {
            println!("  [ok]   Config valid");
            config
        }
        Err(e) => {
            println!("  [fail] Config invalid: {e}");
            println!("\n  1+ issue(s) found. Fix the config and re-run.");
            return Ok(());
        }
    };

    match StaticCredentialStore::from_config(&config.users) {
        Ok(store) if store.is_empty() => {
            println!("  [warn] No [[users]] configured; nobody can log in");
            issues += 1;
        }
        Ok(store) => println!("  [ok]   {} user(s) configured", store.len()),
        Err(e) => {
            println!("  [fail] {e}");
            issues += 1;
        }
    }

    match config.api_key.as_deref() {
        Some(key) if config.has_api_key() => {
            println!("  [ok]   API key: {}", mask_key(key));
            let client = DeepSeekClient::from_config(&config);
            match test_connection(&client).await {
                Ok(reply) => println!(
                    "  [ok]   {} answered ({} chars)",
                    config.model,
                    reply.chars().count()
                ),
                Err(e) => {
                    println!("  [fail] Connection test failed: {e}");
                    issues += 1;
                }
            }
        }
        _ => {
            println!("  [warn] No API key; set DEEPSEEK_API_KEY (fallback answers only)");
            issues += 1;
        }
    }

    if config.storage.backend == "file" {
        let dir = Path::new(&config.storage.data_dir);
        match tokio::fs::create_dir_all(dir).await {
            Ok(()) => println!("  [ok]   Data directory: {}", dir.display()),
            Err(e) => {
                println!("  [fail] Data directory {} not writable: {e}", dir.display());
                issues += 1;
            }
        }
    } else {
        println!("  [ok]   In-memory storage (nothing persists)");
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
