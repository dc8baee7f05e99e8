use anyhow::{anyhow, Context};
use colored::Colorize;
use grove_sdk::{
    BranchCommand, Command as RepoCommand, ContributorCommand, ErrorKind, MergeChange, Outcome,
    PrCommand, Repository, RoleCommand,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut repo = Repository::open_dir(&cli.repo)
        .with_context(|| format!("cannot open repository at {}", cli.repo.display()))?;
    if let Some(author) = cli.author {
        repo.set_author(author)?;
    }
    let outcome = repo.execute(to_repo_command(cli.command)).map_err(|e| match e.kind() {
        ErrorKind::Invariant => anyhow!("internal error: {e}"),
        kind => anyhow!("{kind}: {e}"),
    })?;
    print_outcome(&outcome);
    Ok(())
}

/// Map parsed arguments onto a repository command.
pub fn to_repo_command(command: Command) -> RepoCommand {
    match command {
        Command::Init => RepoCommand::Init,
        Command::Add(args) => RepoCommand::Add { path: args.path },
        Command::Commit(args) => RepoCommand::Commit {
            message: args.message,
        },
        Command::Log => RepoCommand::Log,
        Command::Checkout(args) => RepoCommand::Checkout {
            target: args.target,
        },
        Command::Status => RepoCommand::Status,
        Command::Branch(args) => RepoCommand::Branch(branch_command(args)),
        Command::Pr(args) => RepoCommand::Pr(match args.action {
            PrAction::Create {
                source,
                target,
                title,
            } => PrCommand::Create {
                source,
                target,
                title,
            },
            PrAction::Status => PrCommand::Status,
            PrAction::Next => PrCommand::Next,
            PrAction::Approve { id } => PrCommand::Approve { id },
            PrAction::Reject { id } => PrCommand::Reject { id },
            PrAction::Cancel { id } => PrCommand::Cancel { id },
            PrAction::List => PrCommand::List,
            PrAction::Clear => PrCommand::Clear,
        }),
        Command::Contributors(args) => RepoCommand::Contributors(match args.action {
            None => ContributorCommand::List,
            Some(ContributorAction::Add { name, role }) => ContributorCommand::Add { name, role },
            Some(ContributorAction::Remove { name }) => ContributorCommand::Remove { name },
            Some(ContributorAction::Find { name }) => ContributorCommand::Find { name },
        }),
        Command::Role(args) => RepoCommand::Role(match args.action {
            RoleAction::Add {
                user,
                role,
                permissions,
            } => RoleCommand::Add {
                user,
                role,
                permissions,
            },
            RoleAction::Update {
                user,
                role,
                permissions,
            } => RoleCommand::Update {
                user,
                role,
                permissions,
            },
            RoleAction::Remove { user } => RoleCommand::Remove { user },
            RoleAction::Show { user } => RoleCommand::Show { user },
            RoleAction::Check { user, action } => RoleCommand::Check { user, action },
            RoleAction::List => RoleCommand::List,
        }),
    }
}

fn branch_command(args: BranchArgs) -> BranchCommand {
    if let Some(BranchAction::Merge { source, target }) = args.action {
        return BranchCommand::Merge { source, target };
    }
    match (args.delete, args.name) {
        (Some(name), _) => BranchCommand::Delete { name },
        (None, Some(name)) if !args.list => BranchCommand::Create { name },
        _ => BranchCommand::List,
    }
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Initialized { created: true } => {
            println!("{} {}", "✓".green().bold(), outcome);
        }
        Outcome::Staged(files) if !files.is_empty() => {
            for line in outcome.to_string().lines() {
                println!("  {}", line.green());
            }
        }
        Outcome::Committed(commit) => {
            println!(
                "{} [{} {}] {}",
                "✓".green().bold(),
                commit.branch.yellow(),
                commit.id.to_string().cyan(),
                commit.message
            );
            println!("  {} file(s) committed", commit.files.len());
        }
        Outcome::Log { commits, .. } if !commits.is_empty() => {
            for line in outcome.to_string().lines() {
                if line.starts_with("commit ") {
                    println!("{}", line.yellow());
                } else {
                    println!("{line}");
                }
            }
        }
        Outcome::Branches { .. } => {
            for line in outcome.to_string().lines() {
                if line.starts_with('*') {
                    println!("{}", line.green().bold());
                } else {
                    println!("{line}");
                }
            }
        }
        Outcome::Status { .. } => {
            let mut staged = false;
            for line in outcome.to_string().lines() {
                if !line.starts_with(' ') {
                    staged = line == "Changes to be committed:";
                    println!("{line}");
                } else if staged {
                    println!("{}", line.green());
                } else {
                    println!("{}", line.red());
                }
            }
        }
        Outcome::Merged(report) => {
            for line in outcome.to_string().lines() {
                let body = line.trim_start();
                if body.starts_with("+++") || body.starts_with("---") {
                    println!("{}", line.bold());
                } else if body.starts_with('+') {
                    println!("{}", line.green());
                } else if body.starts_with('-') {
                    println!("{}", line.red());
                } else if body.starts_with("@@") {
                    println!("{}", line.cyan());
                } else {
                    println!("{line}");
                }
            }
            if report.count(MergeChange::Modified) > 0 {
                println!(
                    "{}",
                    "  note: modified files carry no diff, prior content is not stored".dimmed()
                );
            }
        }
        Outcome::PermissionChecked { allowed, .. } => {
            let verdict = if *allowed { "✓".green().bold() } else { "✗".red().bold() };
            println!("{verdict} {outcome}");
        }
        Outcome::BranchCreated { .. }
        | Outcome::BranchDeleted { .. }
        | Outcome::SwitchedBranch { .. }
        | Outcome::CheckedOutCommit { .. }
        | Outcome::PrCreated(_)
        | Outcome::PrAdvanced(Some(_))
        | Outcome::PrApproved { .. }
        | Outcome::PrRejected(_)
        | Outcome::PrCancelled(_)
        | Outcome::PrCleared(_)
        | Outcome::ContributorAdded(_)
        | Outcome::ContributorRemoved(_)
        | Outcome::RoleAssigned { .. }
        | Outcome::RoleUpdated { .. }
        | Outcome::RoleRemoved { .. } => {
            println!("{} {}", "✓".green().bold(), outcome);
        }
        _ => println!("{outcome}"),
    }
}
