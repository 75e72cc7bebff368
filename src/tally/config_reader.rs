use crate::tally::*;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BEFORE_DIRECTORY: &str = "votacao_partido_munzona_2018";
pub const DEFAULT_AFTER_DIRECTORY: &str = "votacao_partido_munzona_2022";
pub const DEFAULT_MAX_ITEMS: usize = 120;
pub const DEFAULT_OTHERS_LABEL: &str = "OUTROS";

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "maxItems")]
    pub max_items: Option<usize>,
    #[serde(rename = "renderCharts")]
    pub render_charts: Option<bool>,
    #[serde(rename = "othersLabel")]
    pub others_label: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SourceDirectory {
    pub label: String,
    pub directory: String,
    #[serde(rename = "trackCoalitions")]
    pub track_coalitions: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnKeywords {
    #[serde(rename = "partyKeywords")]
    pub party_keywords: Option<Vec<String>>,
    #[serde(rename = "votesKeywords")]
    pub votes_keywords: Option<Vec<String>>,
    #[serde(rename = "coalitionKeywords")]
    pub coalition_keywords: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct TallyConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub sources: Vec<SourceDirectory>,
    #[serde(default)]
    pub columns: ColumnKeywords,
    pub metric: Option<String>,
}

/// One election, ready to be read.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SourceSettings {
    pub label: String,
    pub directory: PathBuf,
    pub track_coalitions: bool,
}

/// The validated settings of a run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnalysisSettings {
    pub before: SourceSettings,
    pub after: SourceSettings,
    pub metric: VoteMetric,
    pub keywords: KeywordSets,
    pub output_directory: PathBuf,
    pub max_items: usize,
    pub render_charts: bool,
    pub others_label: String,
}

pub fn read_config(path: &str) -> TallyResult<TallyConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: TallyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingConfigSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn parse_metric(s: &str) -> TallyResult<VoteMetric> {
    match s {
        "nominal" => Ok(VoteMetric::Nominal),
        "legend" => Ok(VoteMetric::Legend),
        x => InvalidConfigSnafu {
            message: format!("unknown metric {:?} (expected nominal or legend)", x),
        }
        .fail(),
    }
}

fn keyword_list(
    configured: &Option<Vec<String>>,
    default: &[String],
    name: &str,
) -> TallyResult<Vec<String>> {
    match configured {
        Some(v) if v.is_empty() => InvalidConfigSnafu {
            message: format!("{} cannot be empty", name),
        }
        .fail(),
        Some(v) => Ok(v.clone()),
        None => Ok(default.to_vec()),
    }
}

fn default_sources() -> Vec<SourceDirectory> {
    vec![
        SourceDirectory {
            label: "2018".to_string(),
            directory: DEFAULT_BEFORE_DIRECTORY.to_string(),
            track_coalitions: Some(false),
        },
        SourceDirectory {
            label: "2022".to_string(),
            directory: DEFAULT_AFTER_DIRECTORY.to_string(),
            track_coalitions: Some(true),
        },
    ]
}

/// Checks the configuration and applies the defaults and the command line overrides.
///
/// Relative paths in the configuration are relative to `root_path`, the directory of
/// the configuration file. Paths given on the command line are used as they are.
pub fn validate_config(
    config: &TallyConfig,
    root_path: &Path,
    args: &Args,
) -> TallyResult<AnalysisSettings> {
    let metric_s = args
        .metric
        .clone()
        .or_else(|| config.metric.clone())
        .unwrap_or_else(|| "nominal".to_string());
    let metric = parse_metric(&metric_s)?;

    let defaults = KeywordSets::for_metric(metric);
    let keywords = KeywordSets {
        party: keyword_list(&config.columns.party_keywords, &defaults.party, "partyKeywords")?,
        votes: keyword_list(&config.columns.votes_keywords, &defaults.votes, "votesKeywords")?,
        coalition: keyword_list(
            &config.columns.coalition_keywords,
            &defaults.coalition,
            "coalitionKeywords",
        )?,
    };

    let sources = if config.sources.is_empty() {
        default_sources()
    } else {
        config.sources.clone()
    };
    if sources.len() != 2 {
        return InvalidConfigSnafu {
            message: format!(
                "exactly two sources are required (before and after), found {}",
                sources.len()
            ),
        }
        .fail();
    }
    let to_settings = |s: &SourceDirectory, over: &Option<String>| SourceSettings {
        label: s.label.clone(),
        directory: match over {
            Some(d) => PathBuf::from(d),
            None => root_path.join(&s.directory),
        },
        track_coalitions: s.track_coalitions.unwrap_or(false),
    };
    let before = to_settings(&sources[0], &args.before);
    let after = to_settings(&sources[1], &args.after);

    let output_directory = match &args.charts_dir {
        Some(d) => PathBuf::from(d),
        None => root_path.join(
            config
                .output_settings
                .output_directory
                .clone()
                .unwrap_or_else(|| ".".to_string()),
        ),
    };

    let max_items = args
        .max_items
        .or(config.output_settings.max_items)
        .unwrap_or(DEFAULT_MAX_ITEMS);
    if max_items == 0 {
        return InvalidConfigSnafu {
            message: "maxItems must be at least 1".to_string(),
        }
        .fail();
    }

    Ok(AnalysisSettings {
        before,
        after,
        metric,
        keywords,
        output_directory,
        max_items,
        render_charts: !args.no_charts && config.output_settings.render_charts.unwrap_or(true),
        others_label: config
            .output_settings
            .others_label
            .clone()
            .unwrap_or_else(|| DEFAULT_OTHERS_LABEL.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let s = validate_config(&TallyConfig::default(), Path::new(""), &Args::default()).unwrap();
        assert_eq!(s.before.label, "2018");
        assert_eq!(s.before.directory, PathBuf::from(DEFAULT_BEFORE_DIRECTORY));
        assert!(!s.before.track_coalitions);
        assert_eq!(s.after.directory, PathBuf::from(DEFAULT_AFTER_DIRECTORY));
        assert!(s.after.track_coalitions);
        assert_eq!(s.metric, VoteMetric::Nominal);
        assert_eq!(s.keywords, KeywordSets::default());
        assert_eq!(s.max_items, 120);
        assert_eq!(s.others_label, "OUTROS");
        assert!(s.render_charts);
    }

    #[test]
    fn parses_camel_case_config() {
        let js = r#"{
            "outputSettings": {"outputDirectory": "charts", "maxItems": 10, "renderCharts": false},
            "sources": [
                {"label": "2014", "directory": "d2014"},
                {"label": "2018", "directory": "/data/d2018", "trackCoalitions": true}
            ],
            "columns": {"partyKeywords": ["SIGLA"]},
            "metric": "legend"
        }"#;
        let config: TallyConfig = serde_json::from_str(js).unwrap();
        let s = validate_config(&config, Path::new("/etc/tally"), &Args::default()).unwrap();
        assert_eq!(s.before.directory, PathBuf::from("/etc/tally/d2014"));
        assert_eq!(s.after.directory, PathBuf::from("/data/d2018"));
        assert!(s.after.track_coalitions);
        assert_eq!(s.output_directory, PathBuf::from("/etc/tally/charts"));
        assert_eq!(s.max_items, 10);
        assert!(!s.render_charts);
        assert_eq!(s.keywords.party, vec!["SIGLA".to_string()]);
        assert_eq!(s.keywords.votes[0], LEGEND_VOTES_KEYWORD);
        assert_eq!(s.metric, VoteMetric::Legend);
    }

    #[test]
    fn command_line_takes_precedence() {
        let args = Args {
            before: Some("a".to_string()),
            after: Some("b".to_string()),
            metric: Some("nominal".to_string()),
            max_items: Some(5),
            no_charts: true,
            ..Default::default()
        };
        let config = TallyConfig {
            metric: Some("legend".to_string()),
            ..Default::default()
        };
        let s = validate_config(&config, Path::new("/root"), &args).unwrap();
        assert_eq!(s.before.directory, PathBuf::from("a"));
        assert_eq!(s.after.directory, PathBuf::from("b"));
        assert_eq!(s.metric, VoteMetric::Nominal);
        assert_eq!(s.max_items, 5);
        assert!(!s.render_charts);
    }

    #[test]
    fn rejects_invalid_configs() {
        let one_source = TallyConfig {
            sources: vec![SourceDirectory {
                label: "2018".to_string(),
                directory: "x".to_string(),
                track_coalitions: None,
            }],
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&one_source, Path::new(""), &Args::default()),
            Err(TallyError::InvalidConfig { .. })
        ));

        let bad_metric = Args {
            metric: Some("blank".to_string()),
            ..Default::default()
        };
        assert!(validate_config(&TallyConfig::default(), Path::new(""), &bad_metric).is_err());

        let mut empty_keywords = TallyConfig::default();
        empty_keywords.columns.votes_keywords = Some(vec![]);
        assert!(validate_config(&empty_keywords, Path::new(""), &Args::default()).is_err());
    }

    #[test]
    fn missing_config_file() {
        assert!(matches!(
            read_config("/nonexistent/etally.json"),
            Err(TallyError::OpeningConfig { .. })
        ));
    }
}
