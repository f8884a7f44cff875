use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_environment_config, save_environment_config};
use crate::cli::context::CliContext;
use crate::cli::utils::{into_data, output_success, resolve_password};
use crate::cli::OutputFormat;
use crate::models::ProfileFields;
use crate::router::{Navigation, Route};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in with email and password")]
    Login {
        #[arg(help = "Email (defaults to the last one used)")]
        email: Option<String>,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Create an account")]
    Register {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Display name (defaults to the email's local part)")]
        username: Option<String>,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Sign out and forget the stored token")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,
}

pub async fn handle(cmd: AuthCommands, ctx: &CliContext) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let mut env = load_environment_config()?;
            let email = email
                .or_else(|| env.last_email.clone())
                .ok_or_else(|| anyhow::anyhow!("Email is required"))?;
            let password = resolve_password(password)?;

            into_data(ctx.store.login(&email, &password).await)?;

            env.last_email = Some(email.clone());
            save_environment_config(&env)?;
            output_success(&ctx.output, &format!("Signed in as {}", email), Some(json!({ "email": email })))
        }
        AuthCommands::Register { email, username, password } => {
            let password = resolve_password(password)?;
            let profile = username.map(ProfileFields::with_username).unwrap_or_default();

            into_data(ctx.store.register(&email, &password, &profile).await)?;

            let mut env = load_environment_config()?;
            env.last_email = Some(email.clone());
            save_environment_config(&env)?;

            let message = if ctx.store.session().is_some() {
                format!("Registered and signed in as {}", email)
            } else {
                format!("Registered {}; check your inbox to confirm the address", email)
            };
            output_success(&ctx.output, &message, Some(json!({ "email": email })))
        }
        AuthCommands::Logout => {
            ctx.store.logout().await;
            output_success(&ctx.output, "Signed out", None)
        }
        AuthCommands::Status => {
            ctx.store.initialize_auth().await;
            let user = ctx.store.current_user();
            let gated = ctx.guard.check(Route::Profile) == Navigation::Proceed;

            match ctx.output {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "backend": ctx.backend,
                            "authenticated": user.is_some(),
                            "user": user,
                            "token_stored": gated,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    match &user {
                        Some(user) => println!(
                            "Signed in as {} ({})",
                            user.email.as_deref().unwrap_or("unknown"),
                            user.username().unwrap_or("no username")
                        ),
                        None => println!("Not signed in"),
                    }
                    if gated && user.is_none() {
                        println!("A stored token is present but the backend did not accept it");
                    }
                }
            }
            Ok(())
        }
    }
}
