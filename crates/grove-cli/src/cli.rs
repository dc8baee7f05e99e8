use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "grove",
    about = "Grove: a miniature version-control engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Repository root
    #[arg(long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Author recorded on commits and pull requests (overrides config)
    #[arg(long, global = true)]
    pub author: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a repository
    Init,
    /// Stage a file, or every changed file with "."
    Add(AddArgs),
    /// Commit the staged files
    Commit(CommitArgs),
    /// Show commit history
    Log,
    /// Switch to a branch or rewind to a commit
    Checkout(CheckoutArgs),
    /// Show staged, modified, deleted and untracked files
    Status,
    /// List, create, delete or compare branches
    Branch(BranchArgs),
    /// Manage pull requests
    Pr(PrArgs),
    /// Manage contributors
    Contributors(ContributorsArgs),
    /// Manage user roles and permissions
    Role(RoleArgs),
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(default_value = ".")]
    pub path: String,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
}

#[derive(Args)]
pub struct CheckoutArgs {
    /// Branch name or commit id (at least 4 hex characters)
    pub target: String,
}

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct BranchArgs {
    #[command(subcommand)]
    pub action: Option<BranchAction>,
    /// Create this branch under the current one
    pub name: Option<String>,
    #[arg(short = 'd', long, value_name = "NAME", conflicts_with = "name")]
    pub delete: Option<String>,
    #[arg(short, long)]
    pub list: bool,
}

#[derive(Subcommand)]
pub enum BranchAction {
    /// Compare the commits of two branches
    Merge { source: String, target: String },
}

#[derive(Args)]
pub struct PrArgs {
    #[command(subcommand)]
    pub action: PrAction,
}

#[derive(Subcommand)]
pub enum PrAction {
    /// Open a pull request from the staged files
    Create {
        source: String,
        target: String,
        #[arg(long)]
        title: Option<String>,
    },
    Status,
    /// Move the oldest pending request to review
    Next,
    Approve { id: u64 },
    Reject { id: u64 },
    Cancel { id: u64 },
    List,
    Clear,
}

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct ContributorsArgs {
    #[command(subcommand)]
    pub action: Option<ContributorAction>,
    #[arg(short, long)]
    pub list: bool,
}

#[derive(Subcommand)]
pub enum ContributorAction {
    Add { name: String, role: String },
    Remove { name: String },
    Find { name: String },
}

#[derive(Args)]
pub struct RoleArgs {
    #[command(subcommand)]
    pub action: RoleAction,
}

#[derive(Subcommand)]
pub enum RoleAction {
    /// Give a user a role; permissions are comma-separated
    Add {
        user: String,
        role: String,
        #[arg(value_delimiter = ',')]
        permissions: Vec<String>,
    },
    Update {
        user: String,
        role: String,
        #[arg(value_delimiter = ',')]
        permissions: Vec<String>,
    },
    Remove { user: String },
    Show { user: String },
    /// Check whether a user may perform an action
    Check { user: String, action: String },
    List,
}
