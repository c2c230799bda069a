mod data_loader;
mod ranking;
mod ranking_context;
mod report;
mod util;

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use data_loader::Team;
use ranking_context::RankingContext;

const CONTEXT_FILE: &str = "config/ranking.toml";
const GAMES_FILE: &str = "data/games.json";
const TEAMS_FILE: &str = "data/teams.json";
const STANDINGS_FILE: &str = "data/standings.csv";

/*
    The games file is produced by the results scraper; canonical team names,
    integer scores, dates already normalized to the league's offset. This
    binary only ranks what it is handed.
*/

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let context = RankingContext::load(Path::new(CONTEXT_FILE))
        .context("failed to load ranking context")?;

    let games = data_loader::load_games(Path::new(GAMES_FILE)).context("failed to load games")?;
    info!("loaded {} games from {}", games.len(), GAMES_FILE);

    // A context that names no divisions ranks whatever the feed contains.
    let divisions = if context.divisions.is_empty() {
        ranking::divisions_in(&games)
    } else {
        context.divisions.clone()
    };

    let mut all_teams: Vec<Team> = Vec::new();
    let mut all_standings = Vec::new();

    for division in &divisions {
        match ranking::rank_division(division, &games, &context) {
            Ok(standings) => {
                report::print_standings(&standings);
                all_teams.extend(standings.teams.iter().cloned());
                all_standings.push(standings);
            }
            // A structural failure costs only its own division.
            Err(err) => warn!("division {division} failed to rank: {err}"),
        }
    }

    report::write_standings_csv(Path::new(STANDINGS_FILE), &all_standings)
        .context("failed to write standings export")?;

    data_loader::store_teams(Path::new(TEAMS_FILE), &all_teams)
        .context("failed to store team records")?;
    // Rewrite the feed in canonical form (scores that arrived as strings come back numeric).
    data_loader::store_games(Path::new(GAMES_FILE), &games)
        .context("failed to store games")?;
    info!(
        "stored {} team records across {} divisions",
        all_teams.len(),
        all_standings.len()
    );

    Ok(())
}
