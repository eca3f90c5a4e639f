use anyhow::Result;

use crate::models::Config;
use crate::server::run_daemon;

pub async fn handle_serve() -> Result<()> {
    let config = Config::load()?;
    run_daemon(config)
        .await
        .map_err(|e| anyhow::anyhow!("daemon error: {}", e))
}
