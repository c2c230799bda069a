use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

// One played game as the results feed hands it over: camelCase keys, RFC 3339 dates
// normalized to the league's fixed offset. Scores occasionally arrive as strings.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Game {
    pub division: String,
    #[serde(rename = "startDate")]
    pub start_date: DateTime<FixedOffset>,
    #[serde(rename = "endDate")]
    pub end_date: DateTime<FixedOffset>,
    pub location: String,
    #[serde(rename = "awayTeamName")]
    pub away_team_name: String,
    #[serde(rename = "homeTeamName")]
    pub home_team_name: String,
    #[serde(rename = "awayScore")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub away_score: u32,
    #[serde(rename = "homeScore")]
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub home_score: u32,
}

impl Game {
    pub fn involves(&self, name: &str) -> bool {
        self.away_team_name == name || self.home_team_name == name
    }

    pub fn opponent_of(&self, name: &str) -> &str {
        debug_assert!(self.involves(name));

        if self.away_team_name == name {
            &self.home_team_name
        } else {
            &self.away_team_name
        }
    }

    // (own score, opponent score) from the named side's perspective.
    pub fn scores_for(&self, name: &str) -> (u32, u32) {
        debug_assert!(self.involves(name));

        if self.away_team_name == name {
            (self.away_score, self.home_score)
        } else {
            (self.home_score, self.away_score)
        }
    }

    // The side that scored strictly more. A tied score has no winner.
    pub fn winner(&self) -> Option<&str> {
        if self.away_score > self.home_score {
            Some(&self.away_team_name)
        } else if self.home_score > self.away_score {
            Some(&self.home_team_name)
        } else {
            None
        }
    }

    pub fn winning_margin(&self) -> u32 {
        self.away_score.abs_diff(self.home_score)
    }

    // Forfeits are recorded as exactly 1-0 or 0-1.
    pub fn is_forfeit(&self) -> bool {
        matches!(
            (self.away_score, self.home_score),
            (0, 1) | (1, 0)
        )
    }
}

// The composed team record, every derived field populated exactly once per run.
// Written back out for the league site in the same camelCase shape as the feed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Team {
    pub division: String,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    #[serde(rename = "winPercentage")]
    pub win_percentage: f64,
    #[serde(rename = "oWP")]
    pub o_wp: f64,
    #[serde(rename = "ooWP")]
    pub oo_wp: f64,
    pub rpi: f64,
    #[serde(rename = "tieBreaker")]
    pub tie_breaker: i32,
}

// Read-only display projection, one row per ranked team.
#[derive(Serialize, Debug, Clone)]
pub struct RankedTeamRow {
    pub rank: usize,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    #[serde(rename = "WP")]
    pub wp: f64,
    #[serde(rename = "oWP")]
    pub o_wp: f64,
    #[serde(rename = "ooWP")]
    pub oo_wp: f64,
    pub rpi: f64,
    #[serde(rename = "tieBreaker")]
    pub tie_breaker: i32,
}

pub fn load_games(path: &Path) -> Result<Vec<Game>, DataError> {
    let data = fs::read_to_string(path).map_err(|e| DataError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&data).map_err(|e| DataError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn store_games(path: &Path, games: &[Game]) -> Result<(), DataError> {
    write_json(path, games)
}

pub fn store_teams(path: &Path, teams: &[Team]) -> Result<(), DataError> {
    write_json(path, teams)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DataError> {
    let data = serde_json::to_string_pretty(value).map_err(|e| DataError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    fs::write(path, data).map_err(|e| DataError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
