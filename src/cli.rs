use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use const_format::concatcp;

use crate::types::Gender;

/// Line commands understood by the interactive page.
pub const BROWSE_COMMANDS: &str = "    search <text>   or /<text>   Search users (debounced)
    gender <male|female|other|any>
    page <n>, next, prev         Move between pages
    refresh                      Fetch the current page again
    back                         Return to the previous query string
    open <query>                 Replace the whole query string
    url                          Show the current query string
    help, quit";

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "users")]
#[command(about = "Browse a remote user directory with search, gender filter and paging", version)]
#[command(after_help = "EXAMPLES:
    users list                        First page of users
    users list --search john -g male  Search, filtered by gender
    users list --query 'page=2&search=john'
    users browse                      Interactive page driven by a query string")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(long, short = 'o', global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Output as JSON (alias for --format json)
    #[arg(long, global = true, hide = true)]
    pub json: bool,

    /// Suppress informational messages
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Show debug logs and detailed error information
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Get the effective output format, considering --json flag
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render one page of users
    #[command(
        alias = "ls",
        after_help = "EXAMPLES:
    users list --page 3
    users list --search emily
    users list --gender female --page 2
    users list --query 'search=john&gender=male' --page 2"
    )]
    List(ListArgs),
    /// Open the interactive users page
    #[command(
        alias = "b",
        after_help = concatcp!(
            "EXAMPLES:
    users browse
    users browse --query 'page=2&gender=female'

COMMANDS (inside the page):
",
            BROWSE_COMMANDS
        )
    )]
    Browse(BrowseArgs),
    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    users completions bash > ~/.bash_completion.d/users
    users completions zsh > ~/.zfunc/_users
    users completions fish > ~/.config/fish/completions/users.fish")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
    /// Initialize configuration file interactively
    #[command(after_help = "EXAMPLES:
    users init")]
    Init,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ListArgs {
    /// Starting query string (e.g. 'page=2&search=john&gender=male')
    #[arg(long)]
    pub query: Option<String>,

    /// Page number
    #[arg(long, short)]
    pub page: Option<u32>,

    /// Search text
    #[arg(long, short)]
    pub search: Option<String>,

    /// Gender filter
    #[arg(long, short, value_enum)]
    pub gender: Option<Gender>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct BrowseArgs {
    /// Starting query string (e.g. 'page=2&search=john&gender=male')
    #[arg(long)]
    pub query: Option<String>,
}
