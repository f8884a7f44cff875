use crate::cli::context::CliContext;
use crate::cli::utils::{favorite_line, into_data, output_collection};
use crate::router::Route;

pub async fn handle(ctx: &CliContext) -> anyhow::Result<()> {
    ctx.require(Route::Favorites)?;

    let favorites = into_data(ctx.store.fetch_favorites().await)?.unwrap_or_default();
    output_collection(&ctx.output, "favorites", &favorites, "No favorites yet", favorite_line)
}
