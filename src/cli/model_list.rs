//! Model listing

use chrono::{DateTime, Utc};
use std::error::Error;

use crate::api::models::{fetch_models, sort_models};

pub async fn list_models(
    client: &reqwest::Client,
    base_url: &str,
    default_model: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let mut listing = fetch_models(client, base_url).await?;

    println!("🤖 Available models at {base_url}");
    println!();

    if listing.models.is_empty() {
        println!("No models installed on this server.");
        return Ok(());
    }

    sort_models(&mut listing.models);
    for model in &listing.models {
        let marker = if Some(model.name.as_str()) == default_model {
            "*"
        } else {
            " "
        };
        match model.modified_at.as_deref().and_then(format_modified) {
            Some(date) => println!(" {marker} {}  ({date})", model.name),
            None => println!(" {marker} {}", model.name),
        }
    }

    if default_model.is_none() {
        println!();
        println!("No default model set; the first model the server lists is used.");
    }
    Ok(())
}

fn format_modified(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|date| date.with_timezone(&Utc).format("%Y-%m-%d").to_string())
}
