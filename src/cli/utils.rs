use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

use crate::cli::OutputFormat;
use crate::models::{Author, Comment, Favorite, Poem};
use crate::store::ActionResult;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            match data {
                Some(Value::Object(fields)) => {
                    if let Value::Object(map) = &mut response {
                        map.extend(fields);
                    }
                }
                Some(other) => response["data"] = other,
                None => {}
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a collection, one text line per item
pub fn output_collection<T: Serialize>(
    output_format: &OutputFormat,
    collection_name: &str,
    items: &[T],
    empty_message: &str,
    line: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: items }))?);
        }
        OutputFormat::Text if items.is_empty() => {
            println!("{}", empty_message);
        }
        OutputFormat::Text => {
            for item in items {
                println!("{}", line(item));
            }
        }
    }
    Ok(())
}

/// Unwrap an action result, turning a failure into an error for `main` to report
pub fn into_data<T>(result: ActionResult<T>) -> anyhow::Result<Option<T>> {
    let requires_login = result.requires_login();
    match result.into_result() {
        Ok(data) => Ok(data),
        Err(message) if requires_login => {
            Err(anyhow::anyhow!("{} (run `poetry auth login <email>` first)", message))
        }
        Err(message) => Err(anyhow::anyhow!(message)),
    }
}

pub fn poem_line(poem: &Poem) -> String {
    let mut line = format!("{}  {}", poem.id, poem.title);
    if let Some(author) = poem.author_name() {
        line.push_str(&format!("  {}", author));
    }
    if let Some(dynasty) = &poem.dynasty {
        line.push_str(&format!("  [{}]", dynasty));
    }
    line
}

pub fn author_line(author: &Author) -> String {
    match &author.dynasty {
        Some(dynasty) => format!("{}  {}  [{}]", author.id, author.name, dynasty),
        None => format!("{}  {}", author.id, author.name),
    }
}

pub fn comment_line(comment: &Comment) -> String {
    let who = comment
        .user
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("anonymous");
    let indent = if comment.parent_id.is_some() { "    " } else { "" };
    format!("{}{}  {}: {}  (♥ {})", indent, comment.id, who, comment.content, comment.likes_count)
}

pub fn favorite_line(favorite: &Favorite) -> String {
    match &favorite.poem {
        Some(poem) => poem_line(poem),
        None => format!("{}", favorite.poem_id),
    }
}

const PASSWORD_PROMPT: &str = "Password (input is visible; use --password or POETRY_PASSWORD to avoid typing it): ";

/// Password from the flag, then `POETRY_PASSWORD`, then a stdin prompt.
/// The prompt does not disable terminal echo.
pub fn resolve_password(provided: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = provided {
        return Ok(password);
    }
    if let Ok(password) = std::env::var("POETRY_PASSWORD") {
        return Ok(password);
    }

    eprint!("{}", PASSWORD_PROMPT);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(anyhow::anyhow!("Password is required"));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;

    #[test]
    fn poem_line_includes_author_and_dynasty() {
        let mut poem = Poem::new("7", "静夜思");
        poem.dynasty = Some("唐".to_string());
        poem.author = Some(Author::new("li-bai", "李白"));
        assert_eq!(poem_line(&poem), "7  静夜思  李白  [唐]");
    }

    #[test]
    fn login_failures_carry_a_hint() {
        let err = into_data::<()>(ActionResult::failed(&GatewayError::Unauthenticated)).unwrap_err();
        assert!(err.to_string().contains("poetry auth login"));

        let err = into_data::<()>(ActionResult::failed(&GatewayError::remote(500, "boom"))).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn password_flag_skips_the_prompt() {
        assert_eq!(resolve_password(Some("moonlight".to_string())).unwrap(), "moonlight");
    }

    #[test]
    fn password_prompt_warns_about_echo() {
        assert!(PASSWORD_PROMPT.contains("visible"));
        assert!(PASSWORD_PROMPT.contains("--password"));
        assert!(PASSWORD_PROMPT.contains("POETRY_PASSWORD"));
    }
}
