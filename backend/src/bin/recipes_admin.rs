//! Operator CLI for the recipe store.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use pagination::PageRequest;
use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use recipes::domain::ports::{RecipeCommand, RecipeQuery};
use recipes::domain::{Error, RecipeService};
use recipes::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselRecipeRepository, DieselUserRepository, PoolConfig,
    run_migrations,
};
use recipes::settings::RecipeSettings;

type Service = RecipeService<DieselRecipeRepository, DieselUserRepository, DieselCommentRepository>;

/// `recipes-admin` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "recipes-admin",
    about = "Inspect and maintain the recipe store",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `RECIPES_DATABASE_URL`, then
    /// `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum AdminCommand {
    /// Apply pending schema migrations.
    Migrate,
    /// List recipes of one type, newest first.
    List {
        /// Recipe type to list.
        recipe_type: String,
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Recipes per page.
        #[arg(long = "page-size", default_value_t = pagination::DEFAULT_PAGE_SIZE.get())]
        page_size: u32,
    },
    /// Show a recipe with its owner and raters resolved.
    Show {
        /// Recipe identifier.
        recipe_id: String,
    },
    /// Create a recipe from a JSON payload.
    Create {
        /// Owning user identifier.
        owner_id: String,
        /// Recipe payload as a JSON object.
        #[arg(value_parser = parse_json)]
        payload: Value,
    },
    /// Merge a JSON patch into a recipe.
    Update {
        /// Recipe identifier.
        recipe_id: String,
        /// Partial payload as a JSON object.
        #[arg(value_parser = parse_json)]
        patch: Value,
    },
    /// Submit a rating on behalf of a user.
    Rate {
        /// Recipe identifier.
        recipe_id: String,
        /// Rating user identifier.
        user_id: String,
        /// Rating value.
        rating: f64,
    },
    /// Delete a recipe and every reference to it. Safe to re-run.
    Remove {
        /// Recipe identifier.
        recipe_id: String,
    },
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = RecipeSettings::load_from_iter([OsString::from("recipes-admin")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let database_url = resolve_database_url(args.database_url, settings.database_url())?;

    if matches!(args.command, AdminCommand::Migrate) {
        let applied = tokio::task::spawn_blocking(move || run_migrations(&database_url))
            .await
            .map_err(|error| io::Error::other(format!("migration task: {error}")))?
            .map_err(io::Error::other)?;
        println!("applied={}", applied.len());
        for version in applied {
            println!("version={version}");
        }
        return Ok(());
    }

    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(settings.pool_max_size))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    let service = RecipeService::new(
        Arc::new(DieselRecipeRepository::new(pool.clone())),
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselCommentRepository::new(pool)),
        Arc::new(DefaultClock),
    )
    .with_rating_policy(settings.rating_policy());

    run_command(&service, args.command).await
}

async fn run_command(service: &Service, command: AdminCommand) -> io::Result<()> {
    match command {
        AdminCommand::Migrate => Ok(()),
        AdminCommand::List {
            recipe_type,
            page,
            page_size,
        } => {
            let request = PageRequest::new(page, page_size).map_err(|error| {
                io::Error::new(io::ErrorKind::InvalidInput, error.to_string())
            })?;
            print_json(&service.list_by_type(&recipe_type, request).await.map_err(domain_error)?)
        }
        AdminCommand::Show { recipe_id } => {
            print_json(&service.detailed(&recipe_id).await.map_err(domain_error)?)
        }
        AdminCommand::Create { owner_id, payload } => {
            print_json(&service.create(payload, &owner_id).await.map_err(domain_error)?)
        }
        AdminCommand::Update { recipe_id, patch } => {
            print_json(&service.update(&recipe_id, patch).await.map_err(domain_error)?)
        }
        AdminCommand::Rate {
            recipe_id,
            user_id,
            rating,
        } => {
            let receipt = service
                .submit_rating(&recipe_id, &user_id, rating)
                .await
                .map_err(domain_error)?;
            println!("{}", receipt.confirmation());
            println!("attempts={}", receipt.attempts);
            Ok(())
        }
        AdminCommand::Remove { recipe_id } => {
            let removal = service.remove(&recipe_id).await.map_err(domain_error)?;
            println!("{}", removal.confirmation());
            println!("favorites_cleared={}", removal.favorites_cleared);
            println!("owner_detached={}", removal.owner_detached);
            println!("comments_deleted={}", removal.comments_deleted);
            Ok(())
        }
    }
}

fn print_json(value: &impl Serialize) -> io::Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| io::Error::other(format!("render output: {error}")))?;
    println!("{rendered}");
    Ok(())
}

fn domain_error(error: Error) -> io::Error {
    io::Error::other(format!("{:?}: {}", error.code(), error.message()))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|error| format!("invalid JSON: {error}"))
}

fn resolve_database_url(explicit: Option<String>, configured: Option<&str>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }
    if let Some(value) = configured {
        return Ok(value.to_owned());
    }

    let from_env = env::var("DATABASE_URL").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url, RECIPES_DATABASE_URL or DATABASE_URL",
        )
    })?;
    if from_env.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "DATABASE_URL must not be empty",
        ));
    }
    Ok(from_env)
}
