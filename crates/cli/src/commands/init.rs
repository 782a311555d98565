//! `shanghan init`: Write a default config file.

use std::path::Path;

use shanghan_config::AppConfig;

pub async fn run(path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(AppConfig::default_path);

    if path.exists() && !force {
        println!("Config already exists at: {}", path.display());
        println!("   Edit it manually or re-run with --force.");
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, AppConfig::default_toml()).await?;

    println!("Created {}", path.display());
    println!();
    println!("Next steps:");
    println!("   1. Set DEEPSEEK_API_KEY or add api_key to the file");
    println!("   2. Add users: shanghan hash-password <password>, then a [[users]] entry");
    println!("   3. Run: shanghan serve");

    Ok(())
}
