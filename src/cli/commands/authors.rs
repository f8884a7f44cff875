use clap::Subcommand;
use serde_json::json;

use crate::cli::context::CliContext;
use crate::cli::utils::{author_line, into_data, output_collection, poem_line};
use crate::cli::OutputFormat;
use crate::models::{AuthorFilters, RecordId};

#[derive(Subcommand)]
pub enum AuthorCommands {
    #[command(about = "List authors")]
    List {
        #[arg(long, help = "Only authors from this dynasty")]
        dynasty: Option<String>,
    },

    #[command(about = "Show an author and their works")]
    Show {
        #[arg(help = "Author id")]
        id: String,
    },
}

pub async fn handle(cmd: AuthorCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let store = &ctx.store;

    match cmd {
        AuthorCommands::List { dynasty } => {
            into_data(store.fetch_authors(&AuthorFilters { dynasty }).await)?;
            output_collection(&ctx.output, "authors", &store.authors(), "No authors found", author_line)
        }
        AuthorCommands::Show { id } => {
            let id = RecordId::from(id);
            let (author, works) = futures::join!(store.fetch_author(&id), store.fetch_author_works(&id));
            let author = into_data(author)?.ok_or_else(|| anyhow::anyhow!("Author {} not found", id))?;
            let works = into_data(works)?.unwrap_or_default();

            match ctx.output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "author": author, "works": works }))?);
                }
                OutputFormat::Text => {
                    println!("{}", author_line(&author));
                    if let Some(bio) = &author.biography {
                        println!();
                        println!("{}", bio);
                    }
                    println!();
                    println!("Works ({}):", works.len());
                    for poem in &works {
                        println!("  {}", poem_line(poem));
                    }
                }
            }
            Ok(())
        }
    }
}
