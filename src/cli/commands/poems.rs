use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_environment_config, save_environment_config};
use crate::cli::context::CliContext;
use crate::cli::utils::{comment_line, into_data, output_collection, output_success, poem_line};
use crate::cli::OutputFormat;
use crate::models::{PoemFilters, RecordId};

#[derive(Subcommand)]
pub enum PoemCommands {
    #[command(about = "List poems, optionally filtered")]
    List {
        #[arg(long, help = "Only poems from this dynasty")]
        dynasty: Option<String>,
        #[arg(long = "type", help = "Only poems of this form")]
        kind: Option<String>,
        #[arg(long, help = "Only poems by this author id")]
        author: Option<String>,
    },

    #[command(about = "Show a poem with its comments")]
    Show {
        #[arg(help = "Poem id")]
        id: String,
    },

    #[command(about = "Search titles and content")]
    Search {
        #[arg(help = "Text to look for (omit to list recent searches)")]
        query: Option<String>,
    },

    #[command(about = "Show the featured selection")]
    Featured,

    #[command(about = "Show recently added poems")]
    Recent,

    #[command(about = "Add a poem to your favorites")]
    Favorite {
        #[arg(help = "Poem id")]
        id: String,
    },

    #[command(about = "Remove a poem from your favorites")]
    Unfavorite {
        #[arg(help = "Poem id")]
        id: String,
    },
}

pub async fn handle(cmd: PoemCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let store = &ctx.store;

    match cmd {
        PoemCommands::List { dynasty, kind, author } => {
            let filters = PoemFilters { dynasty, kind, author: author.map(RecordId::from) };
            into_data(store.fetch_poems(&filters).await)?;
            output_collection(&ctx.output, "poems", &store.poems(), "No poems found", poem_line)
        }
        PoemCommands::Show { id } => {
            let id = RecordId::from(id);
            let (poem, comments) = futures::join!(store.fetch_poem(&id), store.fetch_comments(&id));
            let poem = into_data(poem)?.ok_or_else(|| anyhow::anyhow!("Poem {} not found", id))?;
            // Comments are optional; the legacy API has none
            let comments = comments.data.unwrap_or_default();

            match ctx.output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "poem": poem, "comments": comments }))?);
                }
                OutputFormat::Text => {
                    println!("{}", poem.title);
                    let byline = [poem.author_name(), poem.dynasty.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(" · ");
                    if !byline.is_empty() {
                        println!("{}", byline);
                    }
                    println!();
                    println!("{}", poem.content);
                    if !comments.is_empty() {
                        println!();
                        println!("Comments:");
                        for comment in &comments {
                            println!("  {}", comment_line(comment));
                        }
                    }
                }
            }
            Ok(())
        }
        PoemCommands::Search { query: None } => {
            let env = load_environment_config()?;
            output_collection(&ctx.output, "recent_searches", &env.recent_searches, "No recent searches", |q| q.clone())
        }
        PoemCommands::Search { query: Some(query) } => {
            into_data(store.search_poems(&query).await)?;

            let mut env = load_environment_config()?;
            env.remember_search(&query);
            save_environment_config(&env)?;

            output_collection(&ctx.output, "results", &store.search_results(), "No matching poems", poem_line)
        }
        PoemCommands::Featured => {
            into_data(store.fetch_poems(&PoemFilters::default()).await)?;
            output_collection(&ctx.output, "poems", &store.featured_poems(), "No poems found", poem_line)
        }
        PoemCommands::Recent => {
            into_data(store.fetch_poems(&PoemFilters::default()).await)?;
            output_collection(&ctx.output, "poems", &store.recent_poems(), "No poems found", poem_line)
        }
        PoemCommands::Favorite { id } => {
            into_data(store.favorite_poem(&RecordId::from(id.as_str())).await)?;
            output_success(&ctx.output, &format!("Added poem {} to favorites", id), Some(json!({ "poem_id": id })))
        }
        PoemCommands::Unfavorite { id } => {
            into_data(store.unfavorite_poem(&RecordId::from(id.as_str())).await)?;
            output_success(&ctx.output, &format!("Removed poem {} from favorites", id), Some(json!({ "poem_id": id })))
        }
    }
}
