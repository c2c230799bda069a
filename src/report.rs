use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ranking::DivisionStandings;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

pub fn print_standings(standings: &DivisionStandings) {
    println!("\n{} Standings:", standings.division);
    println!(
        "{0:>4} | {1:24} | {2:>4} | {3:>6} | {4:>6} | {5:>6} | {6:>6} | {7:>6} | {8:>10}",
        "rank", "name", "wins", "losses", "WP", "oWP", "ooWP", "rpi", "tieBreaker",
    );

    for row in &standings.rows {
        println!(
            "{0:>4} | {1:24} | {2:>4} | {3:>6} | {4:>6.4} | {5:>6.4} | {6:>6.4} | {7:>6.4} | {8:>10}",
            row.rank,
            row.name,
            row.wins,
            row.losses,
            row.wp,
            row.o_wp,
            row.oo_wp,
            row.rpi,
            row.tie_breaker,
        );
    }

    for err in &standings.unranked {
        println!("     | unranked: {err}");
    }
}

// One flat export across divisions, a leading division column on every row.
pub fn write_standings_csv(
    path: &Path,
    all_standings: &[DivisionStandings],
) -> Result<(), ReportError> {
    let csv_err = |e: csv::Error| ReportError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;

    writer
        .write_record([
            "division",
            "rank",
            "name",
            "wins",
            "losses",
            "WP",
            "oWP",
            "ooWP",
            "rpi",
            "tieBreaker",
        ])
        .map_err(csv_err)?;

    for standings in all_standings {
        for row in &standings.rows {
            writer
                .write_record([
                    standings.division.clone(),
                    row.rank.to_string(),
                    row.name.clone(),
                    row.wins.to_string(),
                    row.losses.to_string(),
                    format!("{:.4}", row.wp),
                    format!("{:.4}", row.o_wp),
                    format!("{:.4}", row.oo_wp),
                    format!("{:.4}", row.rpi),
                    row.tie_breaker.to_string(),
                ])
                .map_err(csv_err)?;
        }
    }

    writer.flush().map_err(|e| ReportError::Csv {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::RankedTeamRow;
    use std::fs;

    #[test]
    fn csv_export_writes_one_row_per_ranked_team() {
        let standings = vec![
            DivisionStandings {
                division: "10U".to_string(),
                rows: vec![RankedTeamRow {
                    rank: 1,
                    name: "Hawks".to_string(),
                    wins: 3,
                    losses: 1,
                    wp: 0.75,
                    o_wp: 0.5,
                    oo_wp: 0.625,
                    rpi: 0.625,
                    tie_breaker: 27,
                }],
                teams: Vec::new(),
                unranked: Vec::new(),
            },
            DivisionStandings {
                division: "12U".to_string(),
                rows: vec![RankedTeamRow {
                    rank: 1,
                    name: "Comets".to_string(),
                    wins: 2,
                    losses: 0,
                    wp: 1.0,
                    o_wp: 0.25,
                    oo_wp: 0.5,
                    rpi: 0.6,
                    tie_breaker: 20,
                }],
                teams: Vec::new(),
                unranked: Vec::new(),
            },
        ];

        let dir = std::env::temp_dir().join("rpi_standings_csv_export");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("standings.csv");

        write_standings_csv(&path, &standings).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "division,rank,name,wins,losses,WP,oWP,ooWP,rpi,tieBreaker"
        );
        assert_eq!(lines[1], "10U,1,Hawks,3,1,0.7500,0.5000,0.6250,0.6250,27");
        assert_eq!(lines[2], "12U,1,Comets,2,0,1.0000,0.2500,0.5000,0.6000,20");

        let _ = fs::remove_dir_all(&dir);
    }
}
