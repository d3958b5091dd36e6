use clap::Parser;

/// Tabulates an election with tied rankings and looks for the smallest coalition of
/// voters that can change its winner.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A configuration file in JSON format. See the manual for the
    /// description of the options.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The file containing the ballots, in the PrefLib format. Setting this
    /// option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the summary of an election in JSON format. If provided, tiedstv will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, only the election is tabulated and the manipulation search is skipped.
    #[clap(long, takes_value = false)]
    pub no_search: bool,

    /// If passed as an argument, the manipulation search runs on all the available cores.
    #[clap(long, takes_value = false)]
    pub parallel: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
