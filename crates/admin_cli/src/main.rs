use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, EngineError, Money, Platform};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "balance_admin")]
#[command(about = "Admin utilities for Balance (users, balances, history)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./balance.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    /// Show the balances of a user.
    Balance(BalanceArgs),
    /// Show the history of a user.
    History(HistoryArgs),
    /// Record an expense on behalf of a user.
    Charge(ChargeArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    List(PlatformArg),
    Register(UserRegisterArgs),
}

#[derive(Args, Debug)]
struct PlatformArg {
    #[arg(long, default_value = "telegram", value_parser = parse_platform)]
    platform: Platform,
}

#[derive(Args, Debug)]
struct UserRegisterArgs {
    #[command(flatten)]
    platform: PlatformArg,
    #[arg(long)]
    platform_id: String,
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct BalanceArgs {
    #[command(flatten)]
    platform: PlatformArg,
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[command(flatten)]
    platform: PlatformArg,
    #[arg(long)]
    user: String,
    /// Only show entries involving this user too.
    #[arg(long)]
    with: Option<String>,
}

#[derive(Args, Debug)]
struct ChargeArgs {
    #[command(flatten)]
    platform: PlatformArg,
    #[arg(long)]
    from: String,
    #[arg(long, num_args = 1.., required = true)]
    to: Vec<String>,
    /// Whole amount to split, negative for a payment.
    #[arg(long, allow_hyphen_values = true)]
    amount: Money,
}

fn parse_platform(raw: &str) -> Result<Platform, String> {
    Platform::try_from(raw).map_err(|err| err.to_string())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn find_or_exit(engine: &Engine, platform: Platform, username: &str) -> engine::User {
    match engine.find_user_by_username(platform, username).await {
        Ok(user) => user,
        Err(err) => {
            eprintln!("user not found: {username} ({err})");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::List(args),
        }) => {
            for user in engine.list_users().await? {
                let platform_id = user
                    .platform_ids
                    .get(&args.platform)
                    .map(String::as_str)
                    .unwrap_or("-");
                println!(
                    "{}\t{}\t{}",
                    user.id,
                    platform_id,
                    user.display_name(args.platform)
                );
            }
        }
        Command::User(User {
            command: UserCommand::Register(args),
        }) => {
            let platform = args.platform.platform;
            match engine
                .register_user(platform, &args.platform_id, &args.username)
                .await
            {
                Ok(user) => println!("registered user: {} ({})", args.username, user.id),
                Err(EngineError::ExistingKey(_)) => {
                    eprintln!("user already exists: {platform}:{}", args.platform_id);
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Command::Balance(args) => {
            let platform = args.platform.platform;
            let user = find_or_exit(&engine, platform, &args.user).await;
            println!("{}", engine.balance_summary(&user, platform).await?);
        }
        Command::History(args) => {
            let platform = args.platform.platform;
            let user = find_or_exit(&engine, platform, &args.user).await;
            let with = match &args.with {
                Some(name) => Some(find_or_exit(&engine, platform, name).await),
                None => None,
            };
            println!(
                "{}",
                engine
                    .history_statement(&user, with.as_ref(), platform)
                    .await?
            );
        }
        Command::Charge(args) => {
            let platform = args.platform.platform;
            let from = find_or_exit(&engine, platform, &args.from).await;
            let mut to = Vec::with_capacity(args.to.len());
            for name in &args.to {
                to.push(find_or_exit(&engine, platform, name).await.id);
            }

            let receipt = engine.record_expense(from.id, &to, args.amount).await?;
            println!(
                "charged {} to {} account(s), share {}",
                receipt.split.total(),
                receipt.charged.len(),
                receipt.split.share()
            );
            for failure in &receipt.failures {
                eprintln!("failed to charge {}: {}", failure.participant, failure.error);
            }
            if !receipt.is_complete() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
