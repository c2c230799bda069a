use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for `{field}`: {message}")]
    Validation { field: String, message: String },
}

// Every tunable of a ranking run in one place. A run owns its context, so two
// seasons with different exclusion lists can rank concurrently.
//
// The margin bands are inclusive upper bounds: a winning margin up to
// margin_close_max earns bonus_close, up to margin_solid_max earns bonus_solid,
// up to margin_blowout_max earns bonus_blowout, and anything beyond is treated
// as running up the score and earns bonus_runup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingContext {
    // Divisions to rank. Empty means "every division present in the feed".
    pub divisions: Vec<String>,

    // Removed before aggregation; their games count for nobody.
    pub rpi_excluded_teams: Vec<String>,
    // Kept in every calculation but omitted from the displayed standings.
    pub display_excluded_teams: Vec<String>,

    pub wp_weight: f64,
    pub owp_weight: f64,
    pub oowp_weight: f64,

    // Whether an opponent's game against ourselves counts as an OOWP sample.
    pub oowp_includes_self: bool,

    pub margin_close_max: u32,
    pub margin_solid_max: u32,
    pub margin_blowout_max: u32,

    pub bonus_close: i32,
    pub bonus_solid: i32,
    pub bonus_blowout: i32,
    pub bonus_runup: i32,
}

impl Default for RankingContext {
    fn default() -> Self {
        Self {
            divisions: Vec::new(),

            rpi_excluded_teams: Vec::new(),
            display_excluded_teams: Vec::new(),

            wp_weight: 0.4,
            owp_weight: 0.4,
            oowp_weight: 0.2,

            oowp_includes_self: true,

            margin_close_max: 8,
            margin_solid_max: 21,
            margin_blowout_max: 32,

            bonus_close: 10,
            bonus_solid: 7,
            bonus_blowout: 3,
            bonus_runup: -5,
        }
    }
}

impl RankingContext {
    // Loads the context from a TOML file. A missing file is not an error; the
    // built-in defaults apply, and a present file only overrides the keys it names.
    pub fn load(path: &Path) -> Result<Self, ContextError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|e| ContextError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let context: Self = toml::from_str(&text).map_err(|e| ContextError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        context.validate()?;

        Ok(context)
    }

    pub fn validate(&self) -> Result<(), ContextError> {
        for (field, value) in [
            ("wp_weight", self.wp_weight),
            ("owp_weight", self.owp_weight),
            ("oowp_weight", self.oowp_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ContextError::Validation {
                    field: field.to_string(),
                    message: format!("must be between 0.0 and 1.0, got {value}"),
                });
            }
        }

        let weight_sum = self.wp_weight + self.owp_weight + self.oowp_weight;
        if (weight_sum - 1.0).abs() > 1e-9 {
            return Err(ContextError::Validation {
                field: "wp_weight/owp_weight/oowp_weight".to_string(),
                message: format!("must sum to 1.0, got {weight_sum}"),
            });
        }

        if self.margin_close_max >= self.margin_solid_max
            || self.margin_solid_max >= self.margin_blowout_max
        {
            return Err(ContextError::Validation {
                field: "margin_close_max/margin_solid_max/margin_blowout_max".to_string(),
                message: format!(
                    "margin bands must be strictly increasing, got {}/{}/{}",
                    self.margin_close_max, self.margin_solid_max, self.margin_blowout_max
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let context = RankingContext::default();
        context.validate().unwrap();
        assert_eq!(context.wp_weight, 0.4);
        assert_eq!(context.owp_weight, 0.4);
        assert_eq!(context.oowp_weight, 0.2);
        assert!(context.oowp_includes_self);
        assert_eq!(context.margin_close_max, 8);
        assert_eq!(context.margin_solid_max, 21);
        assert_eq!(context.margin_blowout_max, 32);
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let text = r#"
divisions = ["10U", "12U"]
rpi_excluded_teams = ["Percy Priest 12u"]
oowp_includes_self = false
"#;
        let context: RankingContext = toml::from_str(text).unwrap();
        context.validate().unwrap();

        assert_eq!(context.divisions, vec!["10U", "12U"]);
        assert_eq!(context.rpi_excluded_teams, vec!["Percy Priest 12u"]);
        assert!(!context.oowp_includes_self);
        // Untouched keys keep their defaults.
        assert_eq!(context.wp_weight, 0.4);
        assert_eq!(context.bonus_runup, -5);
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let context = RankingContext {
            wp_weight: 0.5,
            owp_weight: 0.5,
            oowp_weight: 0.2,
            ..RankingContext::default()
        };

        let err = context.validate().unwrap_err();
        match err {
            ContextError::Validation { field, .. } => {
                assert!(field.contains("weight"));
            }
            other => panic!("expected Validation error, got: {other}"),
        }
    }

    #[test]
    fn rejects_out_of_range_weight() {
        let context = RankingContext {
            wp_weight: -0.2,
            owp_weight: 1.0,
            oowp_weight: 0.2,
            ..RankingContext::default()
        };

        let err = context.validate().unwrap_err();
        match err {
            ContextError::Validation { field, .. } => assert_eq!(field, "wp_weight"),
            other => panic!("expected Validation error, got: {other}"),
        }
    }

    #[test]
    fn rejects_non_increasing_margin_bands() {
        let context = RankingContext {
            margin_solid_max: 8,
            ..RankingContext::default()
        };

        let err = context.validate().unwrap_err();
        match err {
            ContextError::Validation { field, .. } => assert!(field.contains("margin")),
            other => panic!("expected Validation error, got: {other}"),
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let context = RankingContext::load(Path::new("/nonexistent/ranking.toml")).unwrap();
        assert_eq!(context.wp_weight, 0.4);
        assert!(context.divisions.is_empty());
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let dir = std::env::temp_dir().join("rpi_standings_context_invalid");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ranking.toml");
        fs::write(&path, "this is not [[[ toml").unwrap();

        let err = RankingContext::load(&path).unwrap_err();
        match err {
            ContextError::Parse { path, .. } => assert!(path.ends_with("ranking.toml")),
            other => panic!("expected Parse error, got: {other}"),
        }

        let _ = fs::remove_dir_all(&dir);
    }
}
