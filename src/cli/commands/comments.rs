use clap::Subcommand;
use serde_json::json;

use crate::cli::context::CliContext;
use crate::cli::utils::{comment_line, into_data, output_collection, output_success};
use crate::models::RecordId;

#[derive(Subcommand)]
pub enum CommentCommands {
    #[command(about = "List comments on a poem")]
    List {
        #[arg(help = "Poem id")]
        poem_id: String,
    },

    #[command(about = "Comment on a poem")]
    Add {
        #[arg(help = "Poem id")]
        poem_id: String,
        #[arg(help = "Comment text")]
        content: String,
        #[arg(long, help = "Reply to this comment id")]
        reply_to: Option<String>,
    },

    #[command(about = "Like a comment")]
    Like {
        #[arg(help = "Comment id")]
        comment_id: String,
    },
}

pub async fn handle(cmd: CommentCommands, ctx: &CliContext) -> anyhow::Result<()> {
    let store = &ctx.store;

    match cmd {
        CommentCommands::List { poem_id } => {
            let comments = into_data(store.fetch_comments(&RecordId::from(poem_id)).await)?.unwrap_or_default();
            output_collection(&ctx.output, "comments", &comments, "No comments yet", comment_line)
        }
        CommentCommands::Add { poem_id, content, reply_to } => {
            let parent = reply_to.map(RecordId::from);
            let created = into_data(store.post_comment(&RecordId::from(poem_id), &content, parent.as_ref()).await)?
                .unwrap_or_default();
            output_success(&ctx.output, "Comment posted", Some(json!({ "comments": created })))
        }
        CommentCommands::Like { comment_id } => {
            into_data(store.like_comment(&RecordId::from(comment_id.as_str())).await)?;
            output_success(&ctx.output, &format!("Liked comment {}", comment_id), Some(json!({ "comment_id": comment_id })))
        }
    }
}
