//! `openarchive` command line: one subcommand per archive endpoint plus the dashboard

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{ExportFormat, ReviewStatus};
use crate::search::Direction;

pub mod commands;

pub use commands::run;

/// Compliance console for the OpenArchive email archive
#[derive(Parser, Debug)]
#[command(name = "openarchive")]
#[command(version)]
#[command(about = "Search, review, hold and export archived email from the terminal")]
#[command(long_about = "
Talks to the OpenArchive REST API. Log in once with `openarchive login`; the session is kept
in a JSON file and reused by every other command. `openarchive dashboard` opens the full-screen
terminal dashboard with the tabs your role allows.

Examples:
  openarchive login -u auditor@corp.com
  openarchive search invoice --from cfo@corp.com --has-attachments
  openarchive cases export 12 --format pdf --redact -o case12.pdf
  openarchive dashboard
")]
pub struct Cli {
    /// Archive API base URL
    #[arg(long, global = true, env = "OPENARCHIVE_API_URL")]
    pub api_url: Option<String>,

    /// Where the login session is stored
    #[arg(long, global = true, env = "OPENARCHIVE_SESSION_PATH")]
    pub session: Option<PathBuf>,

    /// Answer yes to confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        #[arg(long, short = 'u', env = "OPENARCHIVE_USERNAME")]
        username: String,
        /// Read from stdin when omitted
        #[arg(long, short = 'p', env = "OPENARCHIVE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Full-text search over archived messages
    Search(SearchArgs),
    /// Inspect one message
    #[command(subcommand)]
    Message(MessageCommand),
    /// eDiscovery cases and review items
    #[command(subcommand)]
    Cases(CaseCommand),
    /// Legal holds
    #[command(subcommand)]
    Holds(HoldCommand),
    /// Tamper-evident audit log
    #[command(subcommand)]
    Audit(AuditCommand),
    /// User accounts
    #[command(subcommand)]
    Users(UserCommand),
    /// Tenant organizations (super admin)
    #[command(subcommand)]
    Orgs(OrgCommand),
    /// Ingestion agent status
    Agents,
    /// Usage analytics for your organization
    Analytics,
    /// Dashboard counters
    Stats,
    /// Retention policies
    #[command(subcommand)]
    Retention(RetentionCommand),
    /// Check that the API is reachable
    Health,
    /// Open the terminal dashboard
    Dashboard,
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Search terms; empty lists everything in scope
    #[arg(default_value = "")]
    pub query: String,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub date_start: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub date_end: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(Direction))]
    pub direction: Option<Direction>,
    #[arg(long)]
    pub attachment_keyword: Option<String>,
    #[arg(long)]
    pub has_attachments: bool,
    #[arg(long)]
    pub spam: bool,
    /// 1-based result page
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Page size; defaults to OPENARCHIVE_PAGE_SIZE
    #[arg(long)]
    pub limit: Option<usize>,
    /// Write the results to a CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum MessageCommand {
    /// Body, attachments and integrity verdict
    Show { id: String },
    /// Other messages in the same conversation
    Thread { id: String },
    /// Raw headers
    Headers { id: String },
    /// Body with PII masked
    Redacted { id: String },
    /// PII findings
    Pii { id: String },
    /// Signature check against the stored hash
    Verify { id: String },
}

#[derive(Subcommand, Debug)]
pub enum CaseCommand {
    List,
    Create {
        name: String,
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Case with its review items
    Show { id: i64 },
    Delete { id: i64 },
    /// Add messages to a case
    Add {
        case_id: i64,
        #[arg(required = true)]
        message_ids: Vec<String>,
    },
    /// Request an export and download it
    Export {
        id: i64,
        #[arg(long, short = 'f', default_value = "native", value_parser = clap::value_parser!(ExportFormat))]
        format: ExportFormat,
        #[arg(long)]
        redact: bool,
        /// Download target; prints the download URL when omitted
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Append a tag to a case item
    Tag { case_id: i64, item_id: i64, tag: String },
    /// Set the review status of a case item
    Status {
        item_id: i64,
        #[arg(value_parser = clap::value_parser!(ReviewStatus))]
        status: ReviewStatus,
    },
    RemoveItem { case_id: i64, item_id: i64 },
    /// Assign case items to an auditor
    Assign {
        case_id: i64,
        /// Auditor user id
        #[arg(long)]
        to: i64,
        #[arg(required = true)]
        item_ids: Vec<i64>,
    },
    /// Items assigned to you
    Assignments,
}

#[derive(Subcommand, Debug)]
pub enum HoldCommand {
    List,
    /// Create a hold; matching messages are held automatically
    Create {
        name: String,
        #[arg(long, short = 'r', default_value = "")]
        reason: String,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        subject: Option<String>,
    },
    Show { id: String },
    Release { id: String },
    /// Put messages on a hold; without --hold the first hold is used or one is created
    Apply {
        #[arg(long)]
        hold: Option<String>,
        #[arg(required = true)]
        message_ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    List {
        /// Defaults to OPENARCHIVE_AUDIT_LOG_LIMIT
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Append an entry
    Append {
        action: String,
        /// JSON payload
        #[arg(long, default_value = "{}")]
        details: String,
    },
    /// Verify the hash chain
    Verify,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    List,
    /// Create an auditor, or a client admin when run as super admin
    Create {
        username: String,
        #[arg(long, short = 'p', env = "OPENARCHIVE_NEW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// Comma separated
        #[arg(long, default_value = "")]
        domains: String,
        /// Target organization (super admin only)
        #[arg(long)]
        org: Option<i64>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum OrgCommand {
    List,
    Create {
        name: String,
        /// Derived from the name when omitted
        #[arg(long)]
        slug: Option<String>,
        /// Comma separated
        #[arg(long, default_value = "")]
        domains: String,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum RetentionCommand {
    List,
    Create {
        name: String,
        #[arg(long, default_value_t = 365)]
        days: i64,
        /// Comma separated; empty applies to every domain
        #[arg(long, default_value = "")]
        domains: String,
    },
    Delete { id: i64 },
    /// Apply retention now
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_filters() {
        let cli = Cli::try_parse_from([
            "openarchive",
            "search",
            "invoice",
            "--from",
            "cfo@corp.com",
            "--direction",
            "sent",
            "--has-attachments",
            "--page",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "invoice");
                assert_eq!(args.direction, Some(Direction::Sent));
                assert!(args.has_attachments);
                assert_eq!(args.page, 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_case_export_and_status() {
        let cli = Cli::try_parse_from(["openarchive", "--yes", "cases", "export", "7", "-f", "pdf", "--redact"]).unwrap();
        assert!(cli.yes);
        assert!(matches!(
            cli.command,
            Command::Cases(CaseCommand::Export { id: 7, format: ExportFormat::Pdf, redact: true, output: None })
        ));

        let cli = Cli::try_parse_from(["openarchive", "cases", "status", "4", "in-review"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cases(CaseCommand::Status { item_id: 4, status: ReviewStatus::InReview })
        ));
        assert!(Cli::try_parse_from(["openarchive", "cases", "status", "4", "done"]).is_err());
    }
}
