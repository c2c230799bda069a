use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::warn;

use crate::data_loader::{Game, RankedTeamRow, Team};
use crate::ranking_context::RankingContext;
use crate::util::{mean, round_to_places};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    WinPercentage,
    OpponentWinPercentage,
    OpponentOpponentWinPercentage,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::WinPercentage => "WP",
            Metric::OpponentWinPercentage => "OWP",
            Metric::OpponentOpponentWinPercentage => "OOWP",
        })
    }
}

#[derive(Debug, Error)]
pub enum RankingError {
    // An opponent name with no team record. Aggregation runs over the same game
    // list, so this is structural and aborts the division's run.
    #[error("team not found in division {division}: {name}")]
    MissingTeam { division: String, name: String },

    // A team that cannot be rated. Isolated to that team; the division still ranks.
    #[error("{metric} is undefined for team {name} in division {division}")]
    UndefinedMetric {
        division: String,
        name: String,
        metric: Metric,
    },
}

// Aggregation snapshot: the win/loss ledger one team accumulated over a
// division's filtered games. Later phases read it, never write it.
#[derive(Debug, Clone)]
pub struct TeamLedger {
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub tie_breaker: i32,
}

impl TeamLedger {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn win_percentage(&self) -> Option<f64> {
        match self.games_played() {
            0 => None,
            played => Some(self.wins as f64 / played as f64),
        }
    }
}

// Opponent-strength snapshot, parallel to the ledger vector. None means the
// sample set was empty.
#[derive(Debug, Clone)]
pub struct TeamStrength {
    pub o_wp: Option<f64>,
    pub oo_wp: Option<f64>,
}

// Everything one division's run produces: display rows, the full rated team
// records (display-excluded teams included, for persistence), and the teams
// that could not be rated.
#[derive(Debug)]
pub struct DivisionStandings {
    pub division: String,
    pub rows: Vec<RankedTeamRow>,
    pub teams: Vec<Team>,
    pub unranked: Vec<RankingError>,
}

// The distinct divisions present in the feed, for a context that names none.
pub fn divisions_in(games: &[Game]) -> Vec<String> {
    let mut divisions: Vec<String> = games.iter().map(|g| g.division.clone()).collect();
    divisions.sort();
    divisions.dedup();
    divisions
}

// Keeps a division's games, minus any game touching an RPI-excluded team.
// Those games count for nobody, not even the excluded team's opponents.
pub fn filter_games(games: &[Game], division: &str, context: &RankingContext) -> Vec<Game> {
    games
        .iter()
        .filter(|g| g.division == division)
        .filter(|g| {
            !context.rpi_excluded_teams.contains(&g.away_team_name)
                && !context.rpi_excluded_teams.contains(&g.home_team_name)
        })
        .cloned()
        .collect()
}

// Phase 1: every name appearing on either side of any game gets a ledger, in
// first-appearance order. A win is scoring strictly more; everything else,
// a tied score included, is a loss. Margin bonuses accrue on wins only.
pub fn collect_teams(games: &[Game], context: &RankingContext) -> Vec<TeamLedger> {
    let mut names: Vec<&str> = Vec::new();
    for g in games {
        for side in [g.away_team_name.as_str(), g.home_team_name.as_str()] {
            if !names.contains(&side) {
                names.push(side);
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let mut ledger = TeamLedger {
                name: name.to_string(),
                wins: 0,
                losses: 0,
                tie_breaker: 0,
            };

            for g in games {
                if !g.involves(name) {
                    continue;
                }

                let (own, opponent) = g.scores_for(name);
                if own > opponent {
                    ledger.wins += 1;
                    ledger.tie_breaker += margin_bonus(g.winning_margin(), context);
                } else {
                    ledger.losses += 1;
                }
            }

            ledger
        })
        .collect()
}

// Margin bands are inclusive upper bounds; past the last band the win is a
// run-up and costs points. A margin only exists on a win, so it is at least 1.
pub fn margin_bonus(margin: u32, context: &RankingContext) -> i32 {
    debug_assert!(margin >= 1);

    if margin <= context.margin_close_max {
        context.bonus_close
    } else if margin <= context.margin_solid_max {
        context.bonus_solid
    } else if margin <= context.margin_blowout_max {
        context.bonus_blowout
    } else {
        context.bonus_runup
    }
}

// Phase 2: OWP and OOWP for every team, against the completed ledgers.
//
// OWP samples the opponent's WP once per game played, so a team faced twice
// counts twice. OOWP samples once per (own game, opponent game) pair; whether
// the opponent's game back against ourselves counts is the context's call.
// Both means are rounded to four places before composition.
pub fn opponent_strength(
    division: &str,
    games: &[Game],
    ledgers: &[TeamLedger],
    context: &RankingContext,
) -> Result<Vec<TeamStrength>, RankingError> {
    let index: HashMap<&str, usize> = ledgers
        .iter()
        .enumerate()
        .map(|(idx, t)| (t.name.as_str(), idx))
        .collect();

    let mut strengths = Vec::with_capacity(ledgers.len());

    for team in ledgers {
        let mut owp_samples = Vec::new();
        let mut oowp_samples = Vec::new();

        for game in games {
            if !game.involves(&team.name) {
                continue;
            }

            let opponent = lookup(&index, ledgers, division, game.opponent_of(&team.name))?;
            if let Some(wp) = opponent.win_percentage() {
                owp_samples.push(wp);
            }

            for opponent_game in games {
                if !opponent_game.involves(&opponent.name) {
                    continue;
                }

                let next_name = opponent_game.opponent_of(&opponent.name);
                if !context.oowp_includes_self && next_name == team.name {
                    continue;
                }

                let next = lookup(&index, ledgers, division, next_name)?;
                if let Some(wp) = next.win_percentage() {
                    oowp_samples.push(wp);
                }
            }
        }

        strengths.push(TeamStrength {
            o_wp: mean(&owp_samples).map(|v| round_to_places(v, 4)),
            oo_wp: mean(&oowp_samples).map(|v| round_to_places(v, 4)),
        });
    }

    Ok(strengths)
}

fn lookup<'a>(
    index: &HashMap<&str, usize>,
    ledgers: &'a [TeamLedger],
    division: &str,
    name: &str,
) -> Result<&'a TeamLedger, RankingError> {
    index
        .get(name)
        .map(|&idx| &ledgers[idx])
        .ok_or_else(|| RankingError::MissingTeam {
            division: division.to_string(),
            name: name.to_string(),
        })
}

// Phase 3: weighted composition into the final record. An undefined input is a
// per-team error, never a silent zero.
pub fn compose_rpi(
    division: &str,
    ledger: &TeamLedger,
    strength: &TeamStrength,
    context: &RankingContext,
) -> Result<Team, RankingError> {
    let undefined = |metric: Metric| RankingError::UndefinedMetric {
        division: division.to_string(),
        name: ledger.name.clone(),
        metric,
    };

    let wp = ledger
        .win_percentage()
        .ok_or_else(|| undefined(Metric::WinPercentage))?;
    let o_wp = strength
        .o_wp
        .ok_or_else(|| undefined(Metric::OpponentWinPercentage))?;
    let oo_wp = strength
        .oo_wp
        .ok_or_else(|| undefined(Metric::OpponentOpponentWinPercentage))?;

    let rpi = round_to_places(
        context.wp_weight * wp + context.owp_weight * o_wp + context.oowp_weight * oo_wp,
        4,
    );

    Ok(Team {
        division: division.to_string(),
        name: ledger.name.clone(),
        wins: ledger.wins,
        losses: ledger.losses,
        win_percentage: wp,
        o_wp,
        oo_wp,
        rpi,
        tie_breaker: ledger.tie_breaker,
    })
}

// Layered comparator, best team first:
//   1. higher RPI;
//   2. on equal RPI, a forfeit between the pair outranks everything else and
//      the team that WON it (did not forfeit) comes first; a balanced split
//      of forfeit wins falls through;
//   3. higher tie-break score;
//   4. the winner of a single head-to-head game;
//   5. no signal, keep input order (the sort is stable).
pub fn compare_teams(a: &Team, b: &Team, games: &[Game]) -> Ordering {
    match b.rpi.partial_cmp(&a.rpi) {
        Some(Ordering::Equal) | None => {}
        Some(order) => return order,
    }

    let head_to_head: Vec<&Game> = games
        .iter()
        .filter(|g| g.involves(&a.name) && g.involves(&b.name))
        .collect();

    let mut a_forfeit_wins = 0;
    let mut b_forfeit_wins = 0;
    for game in head_to_head.iter().filter(|g| g.is_forfeit()) {
        match game.winner() {
            Some(winner) if winner == a.name => a_forfeit_wins += 1,
            Some(winner) if winner == b.name => b_forfeit_wins += 1,
            _ => {}
        }
    }
    if a_forfeit_wins != b_forfeit_wins {
        return b_forfeit_wins.cmp(&a_forfeit_wins);
    }

    if a.tie_breaker != b.tie_breaker {
        return b.tie_breaker.cmp(&a.tie_breaker);
    }

    if let [game] = head_to_head.as_slice() {
        match game.winner() {
            Some(winner) if winner == a.name => return Ordering::Less,
            Some(winner) if winner == b.name => return Ordering::Greater,
            _ => {}
        }
    }

    Ordering::Equal
}

pub fn sort_standings(teams: &mut [Team], games: &[Game]) {
    teams.sort_by(|a, b| compare_teams(a, b, games));
}

// One division, start to finish: filter, aggregate, opponent strength, compose,
// sort, then hide display-excluded teams and hand out 1-based ranks. Teams that
// cannot be rated are reported and skipped; the rest of the division ranks.
pub fn rank_division(
    division: &str,
    games: &[Game],
    context: &RankingContext,
) -> Result<DivisionStandings, RankingError> {
    let division_games = filter_games(games, division, context);
    let ledgers = collect_teams(&division_games, context);
    let strengths = opponent_strength(division, &division_games, &ledgers, context)?;

    let mut teams = Vec::with_capacity(ledgers.len());
    let mut unranked = Vec::new();

    for (ledger, strength) in ledgers.iter().zip(&strengths) {
        match compose_rpi(division, ledger, strength, context) {
            Ok(team) => teams.push(team),
            Err(err) => {
                warn!("skipping unrateable team: {err}");
                unranked.push(err);
            }
        }
    }

    sort_standings(&mut teams, &division_games);

    let rows = teams
        .iter()
        .filter(|t| !context.display_excluded_teams.contains(&t.name))
        .enumerate()
        .map(|(i, t)| RankedTeamRow {
            rank: i + 1,
            name: t.name.clone(),
            wins: t.wins,
            losses: t.losses,
            wp: t.win_percentage,
            o_wp: t.o_wp,
            oo_wp: t.oo_wp,
            rpi: t.rpi,
            tie_breaker: t.tie_breaker,
        })
        .collect();

    Ok(DivisionStandings {
        division: division.to_string(),
        rows,
        teams,
        unranked,
    })
}
