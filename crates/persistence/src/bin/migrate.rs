#![deny(warnings)]

use nation_core::{GAME_CONFIG_ID, SETTINGS};
use persistence::{default_sqlite_url, ensure_parent_dir, init_db, DocumentStore, Repository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_sqlite_url().to_string());
    ensure_parent_dir(&url)?;
    let repo = Repository::new(init_db(&url).await?);
    // seed the configuration singleton so the turn counter starts at zero
    if repo.store().get(SETTINGS, GAME_CONFIG_ID).await?.is_none() {
        repo.update_turn(0, chrono::Utc::now()).await?;
    }
    let turn = repo.game_config().await?.current_turn;
    println!("DB migrated at {} (turn {})", url, turn);
    Ok(())
}
