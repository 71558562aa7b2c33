use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Set proxy
    #[arg(required = false, long, short = 'P', global = true)]
    pub proxy: Option<String>,

    /// Set user agent
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate default config
    #[clap(name = "defconfig")]
    DefConfig,

    /// Print the effective configuration to stdout
    Config,

    /// Check that pagenote is alive
    Ping,

    /// Test the connection to the feedback backend
    #[clap(name = "test", visible_alias = "test-connection")]
    TestConnection,

    /// Save feedback for a page
    #[command(arg_required_else_help = true)]
    Save {
        /// Page the feedback is about
        #[arg(required = true, short, long, value_hint = ValueHint::Url)]
        url: String,

        /// Feedback text
        #[arg(required = true, short, long)]
        text: String,
    },

    /// List feedback for a page, newest first
    #[command(arg_required_else_help = true)]
    #[clap(name = "list", visible_alias = "ls")]
    List {
        /// Page to list feedback for
        #[arg(required = true, value_hint = ValueHint::Url)]
        url: String,

        /// Only show feedback containing this text (case-insensitive)
        #[arg(required = false, short, long)]
        search: Option<String>,
    },

    /// Summarize the feedback for a page with AI
    #[command(arg_required_else_help = true)]
    Summarize {
        /// Page to summarize
        #[arg(required = true, value_hint = ValueHint::Url)]
        url: String,
    },

    /// Answer newline-delimited JSON requests from stdin
    Route,
}
