use serde_json::json;

use crate::cli::context::CliContext;
use crate::cli::OutputFormat;
use crate::router::{Navigation, Route};

pub fn handle(path: &str, ctx: &CliContext) -> anyhow::Result<()> {
    let resolved = Route::resolve(path).ok_or_else(|| anyhow::anyhow!("No route matches {}", path))?;
    let decision = ctx.guard.check(resolved.route);

    match ctx.output {
        OutputFormat::Json => {
            let redirect = match decision {
                Navigation::Proceed => None,
                Navigation::Redirect(to) => Some(to.path()),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "route": resolved.route.name(),
                    "id": resolved.id,
                    "requires_auth": resolved.route.requires_auth(),
                    "redirect": redirect,
                }))?
            );
        }
        OutputFormat::Text => {
            match &resolved.id {
                Some(id) => println!("{} (id {})", resolved.route.name(), id),
                None => println!("{}", resolved.route.name()),
            }
            match decision {
                Navigation::Proceed => println!("→ proceed"),
                Navigation::Redirect(to) => println!("→ redirect to {}", to.path()),
            }
        }
    }
    Ok(())
}
