pub mod commands;
pub mod config;
pub mod context;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::BackendKind;
use context::CliContext;

#[derive(Parser)]
#[command(name = "poetry")]
#[command(about = "Poetry CLI - browse classical poems, authors and comments")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, value_parser = parse_backend, help = "Backend to use (supabase or rest)")]
    pub backend: Option<BackendKind>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Sign in, sign up and session status")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Browse, search and favorite poems")]
    Poems {
        #[command(subcommand)]
        cmd: commands::poems::PoemCommands,
    },

    #[command(about = "Browse authors and their works")]
    Authors {
        #[command(subcommand)]
        cmd: commands::authors::AuthorCommands,
    },

    #[command(about = "Read and write poem comments")]
    Comments {
        #[command(subcommand)]
        cmd: commands::comments::CommentCommands,
    },

    #[command(about = "List the signed-in user's favorite poems")]
    Favorites,

    #[command(about = "Resolve a site path and show the navigation decision")]
    Route {
        #[arg(help = "Path, e.g. /poems/42 or /favorites")]
        path: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn parse_backend(value: &str) -> Result<BackendKind, String> {
    BackendKind::parse(value).ok_or_else(|| format!("unknown backend '{}' (expected supabase or rest)", value))
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let ctx = CliContext::build(cli.backend, output_format)?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx).await,
        Commands::Poems { cmd } => commands::poems::handle(cmd, &ctx).await,
        Commands::Authors { cmd } => commands::authors::handle(cmd, &ctx).await,
        Commands::Comments { cmd } => commands::comments::handle(cmd, &ctx).await,
        Commands::Favorites => commands::favorites::handle(&ctx).await,
        Commands::Route { path } => commands::route::handle(&path, &ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["poetry", "poems", "list", "--dynasty", "唐", "--json", "--backend", "rest"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        assert_eq!(cli.backend, Some(BackendKind::Rest));
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["poetry", "--backend", "graphql", "favorites"]).is_err());
    }
}
