//! `hrdesk` command-line entry point.
//!
//! # Responsibility
//! - Load configuration, start logging, open the database.
//! - Map subcommands onto core services and print plain-text lines.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use hrdesk_core::repo::company_repo::{CompanyListQuery, SqliteCompanyRepository};
use hrdesk_core::repo::invitation_repo::SqliteInvitationRepository;
use hrdesk_core::repo::onboarding_repo::SqliteOnboardingRepository;
use hrdesk_core::repo::task_repo::SqliteTaskRepository;
use hrdesk_core::repo::user_repo::{SqliteUserRepository, UserListQuery, UserRepository};
use hrdesk_core::service::company_service::CompanyService;
use hrdesk_core::service::invitation_service::InvitationService;
use hrdesk_core::service::task_service::TaskService;
use hrdesk_core::{
    init_logging, open_db, DocumentRef, HrdeskConfig, NewTask, NewUser, Role, TaskCategory,
    TaskPriority, TaskStatus,
};
use log::info;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "hrdesk")]
#[command(about = "Multi-tenant HR records on a local SQLite database", version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "hrdesk.toml")]
    config: PathBuf,

    /// Override the database path from configuration
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or migrate the database
    Init,
    #[command(subcommand)]
    Company(CompanyCommand),
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Invite(InviteCommand),
    #[command(subcommand)]
    Task(TaskCommand),
}

#[derive(Subcommand)]
enum CompanyCommand {
    /// Register a company in pending verification state
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        domain: String,
        /// Verification document reference
        #[arg(long)]
        document: Option<String>,
    },
    List {
        /// Only active companies
        #[arg(long)]
        active: bool,
    },
    /// Delete a company and everything it owns
    Delete { id: Uuid },
    Approve { id: Uuid },
    Reject { id: Uuid },
}

#[derive(Subcommand)]
enum UserCommand {
    Create(CreateUserArgs),
    List {
        #[arg(long)]
        company: Option<Uuid>,
    },
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long)]
    company: Uuid,
    #[arg(long)]
    username: String,
    /// `hr` or `employee`
    #[arg(long)]
    role: Role,
    #[arg(long)]
    email: Option<String>,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
}

#[derive(Subcommand)]
enum InviteCommand {
    /// Issue an invitation on behalf of an hr user
    Issue {
        #[arg(long)]
        company: Uuid,
        #[arg(long)]
        email: String,
        #[arg(long)]
        by: Uuid,
    },
    /// Redeem a token into a verified employee account
    Redeem {
        #[arg(long)]
        token: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    Create(CreateTaskArgs),
    /// Set the status of a task
    Status { id: Uuid, status: TaskStatus },
}

#[derive(Args)]
struct CreateTaskArgs {
    #[arg(long)]
    company: Uuid,
    #[arg(long)]
    assigned_to: Uuid,
    /// Creating hr user
    #[arg(long)]
    created_by: Uuid,
    #[arg(long)]
    title: String,
    /// Due date as YYYY-MM-DD
    #[arg(long)]
    due: NaiveDate,
    #[arg(long)]
    category: TaskCategory,
    #[arg(long)]
    priority: Option<TaskPriority>,
    #[arg(long, default_value = "")]
    description: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = HrdeskConfig::load(&cli.config)
        .with_context(|| format!("failed to load config `{}`", cli.config.display()))?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }

    let log_dir = absolute(&config.logging.dir)?;
    init_logging(&config.logging.level, &log_dir).context("failed to initialize logging")?;

    let conn = open_db(&config.database.path)
        .with_context(|| format!("failed to open `{}`", config.database.path.display()))?;
    info!("event=cli_command module=cli status=start");

    match cli.command {
        Command::Init => {
            println!("database ready at {}", config.database.path.display());
        }
        Command::Company(command) => run_company(&conn, command)?,
        Command::User(command) => run_user(&conn, command)?,
        Command::Invite(command) => run_invite(&conn, &config, command)?,
        Command::Task(command) => run_task(&conn, command)?,
    }
    Ok(())
}

fn run_company(conn: &Connection, command: CompanyCommand) -> Result<()> {
    let service = CompanyService::new(SqliteCompanyRepository::try_new(conn)?);
    match command {
        CompanyCommand::Create {
            name,
            domain,
            document,
        } => {
            let document = document.map(DocumentRef::new).transpose()?;
            let company = service.register(name, domain, document)?;
            println!("{} {} {}", company.id, company.name, company.domain);
        }
        CompanyCommand::List { active } => {
            let query = CompanyListQuery {
                is_active: active.then_some(true),
                ..CompanyListQuery::default()
            };
            for company in service.list(&query)? {
                println!(
                    "{} {} {} active={} verification={}",
                    company.id,
                    company.name,
                    company.domain,
                    company.is_active,
                    company.verification_status
                );
            }
        }
        CompanyCommand::Delete { id } => {
            service.delete(id)?;
            println!("deleted {id}");
        }
        CompanyCommand::Approve { id } => {
            let company = service.approve_verification(id)?;
            println!("{} verification={}", company.id, company.verification_status);
        }
        CompanyCommand::Reject { id } => {
            let company = service.reject_verification(id)?;
            println!("{} verification={}", company.id, company.verification_status);
        }
    }
    Ok(())
}

fn run_user(conn: &Connection, command: UserCommand) -> Result<()> {
    let repo = SqliteUserRepository::try_new(conn)?;
    match command {
        UserCommand::Create(args) => {
            let new = NewUser {
                email: args.email,
                first_name: args.first_name,
                last_name: args.last_name,
                ..NewUser::new(args.company, args.username, args.role)
            };
            let user = repo.create_user(new)?;
            info!(
                "event=user_create module=cli status=ok user_id={} company_id={}",
                user.id, user.company_id
            );
            println!("{} {} role={}", user.id, user.username, user.role);
        }
        UserCommand::List { company } => {
            let query = UserListQuery {
                company_id: company,
                ..UserListQuery::default()
            };
            for user in repo.list_users(&query)? {
                println!(
                    "{} {} role={} verified={}",
                    user.id, user.username, user.role, user.is_verified
                );
            }
        }
    }
    Ok(())
}

fn run_invite(conn: &Connection, config: &HrdeskConfig, command: InviteCommand) -> Result<()> {
    let service = InvitationService::with_ttl(
        SqliteInvitationRepository::try_new(conn)?,
        config.invitation_ttl(),
    );
    match command {
        InviteCommand::Issue { company, email, by } => {
            let invitation = service.issue(company, email, by)?;
            println!(
                "{} token={} expires_at={}",
                invitation.id,
                invitation.token,
                invitation.expires_at.to_rfc3339()
            );
        }
        InviteCommand::Redeem {
            token,
            username,
            email,
            first_name,
            last_name,
        } => {
            // Company and role are taken from the invitation.
            let signup = NewUser {
                email,
                first_name,
                last_name,
                ..NewUser::new(Uuid::nil(), username, Role::Employee)
            };
            let (invitation, user) = service.redeem(&token, signup)?;
            println!(
                "{} {} company={} invitation={}",
                user.id, user.username, user.company_id, invitation.id
            );
        }
    }
    Ok(())
}

fn run_task(conn: &Connection, command: TaskCommand) -> Result<()> {
    let service = TaskService::new(
        SqliteTaskRepository::try_new(conn)?,
        SqliteOnboardingRepository::try_new(conn)?,
    );
    match command {
        TaskCommand::Create(args) => {
            let mut new = NewTask::new(
                args.company,
                args.assigned_to,
                args.created_by,
                args.title,
                args.due,
                args.category,
            );
            new.description = args.description;
            if let Some(priority) = args.priority {
                new.priority = priority;
            }
            let task = service.create_task(new)?;
            println!("{} {} status={}", task.id, task.title, task.status);
        }
        TaskCommand::Status { id, status } => {
            let task = service.set_status(id, status)?;
            println!("{} status={}", task.id, task.status);
        }
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}
