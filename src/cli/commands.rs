use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dl", about = concat!("daylist v", env!("CARGO_PKG_VERSION"), " - a to-do list that starts fresh every day"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory, config.toml and an empty task list
    Init(InitArgs),
    /// Interactive session; the daily reset keeps running while it is open
    Shell,
    /// Validate the stored document without changing it
    Check,
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that act on the task list. Also the vocabulary of `dl shell`.
#[derive(Subcommand)]
pub enum StoreCommand {
    /// List todos in the selected group (or every group)
    List(ListArgs),
    /// Add a todo
    Add(AddArgs),
    /// Check or uncheck a todo
    Toggle(TodoIdArg),
    /// Delete a todo
    Rm(TodoIdArg),
    /// Manage groups
    Group(GroupCmd),
    /// Run the daily reset check now
    Reset,
    /// Show where the data lives and what it holds
    Status,
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Group to list (id, name or id prefix; default: the selected group)
    #[arg(long, short)]
    pub group: Option<String>,
    /// List every group
    #[arg(long, conflicts_with = "group")]
    pub all: bool,
}

#[derive(Args)]
pub struct AddArgs {
    /// Todo text
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
    /// Group to add to (default: the selected group)
    #[arg(long, short)]
    pub group: Option<String>,
    /// Create this group, add the todo to it and select it
    #[arg(long, conflicts_with = "group")]
    pub new_group: Option<String>,
}

impl AddArgs {
    pub fn text(&self) -> String {
        self.text.join(" ")
    }
}

#[derive(Args)]
pub struct TodoIdArg {
    /// Todo id or a unique prefix of one
    pub id: String,
}

#[derive(Args)]
pub struct GroupCmd {
    #[command(subcommand)]
    pub action: GroupAction,
}

#[derive(Subcommand)]
pub enum GroupAction {
    /// List groups
    List,
    /// Create a group
    Add(GroupAddArgs),
    /// Delete a group and all of its todos
    Rm(GroupArg),
    /// Select a group
    Select(GroupSelectArgs),
}

#[derive(Args)]
pub struct GroupAddArgs {
    /// Group name
    #[arg(required = true, num_args = 1..)]
    pub name: Vec<String>,
    /// CSS color (default: a random hue)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct GroupArg {
    /// Group id, name or id prefix
    pub group: String,
}

#[derive(Args)]
pub struct GroupSelectArgs {
    /// Group id, name or id prefix
    #[arg(required_unless_present = "none")]
    pub group: Option<String>,
    /// Clear the selection
    #[arg(long, conflicts_with = "group")]
    pub none: bool,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove entries older than 30 days
    Prune(RecoveryPruneArgs),
    /// Print the path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove every entry
    #[arg(long)]
    pub all: bool,
}

/// One line typed into `dl shell`.
#[derive(Parser)]
#[command(name = "dl", no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand)]
pub enum ShellCommand {
    #[command(flatten)]
    Store(StoreCommand),
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}
