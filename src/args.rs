use clap::Parser;

/// Party vote totals for two elections, and how they changed from one to the other.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the inputs and the outputs. If not provided,
    /// the directories votacao_partido_munzona_2018 and votacao_partido_munzona_2022 are used.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory) The result files of the reference election. Overrides the first source of the
    /// configuration.
    #[clap(long, value_parser)]
    pub before: Option<String>,

    /// (directory) The result files of the later election. Overrides the second source of the
    /// configuration.
    #[clap(long, value_parser)]
    pub after: Option<String>,

    /// (file path, 'stdout' or empty) If specified, a summary of all the totals is written in JSON
    /// format to the given location. An empty value writes nothing.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, etally will check that the
    /// computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (directory) Where the charts are written. Overrides outputDirectory in the configuration.
    #[clap(long, value_parser)]
    pub charts_dir: Option<String>,

    /// If passed as an argument, no chart is rendered.
    #[clap(long, takes_value = false)]
    pub no_charts: bool,

    /// (nominal or legend, default nominal) The vote total to aggregate.
    #[clap(long, value_parser)]
    pub metric: Option<String>,

    /// (default 120) The number of categories displayed in a chart. The remaining ones are
    /// grouped together.
    #[clap(long, value_parser)]
    pub max_items: Option<usize>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
