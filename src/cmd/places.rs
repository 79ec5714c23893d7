//! Places provider commands — `craic nearby`, `craic details`.

use anyhow::{Context, Result};
use console::style;

use craic::crowd::CrowdTier;
use craic::discovery::discover;
use craic::geo::{Coordinate, format_distance};
use craic::location::{FixedLocation, resolve_position};
use craic::places::{self, DETAIL_PHOTO_WIDTH, PREVIEW_PHOTO_WIDTH};

use super::{load_config, open_sync};
use crate::Cli;

pub async fn cmd_nearby(
    cli: &Cli,
    position: Option<(f64, f64)>,
    radius: Option<u32>,
    json: bool,
) -> Result<()> {
    let config = load_config(cli)?;
    let client = config.places_client()?;
    let sync = open_sync(&config)?;

    let provider = FixedLocation(position.map(|(lat, lng)| Coordinate::new(lat, lng)));
    let center = resolve_position(&provider, config.default_position()).await;
    let radius_m = radius.unwrap_or_else(|| config.radius_m());

    let pubs = discover(&client, &sync, center, radius_m).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&pubs).context("Failed to serialize results")?
        );
        return Ok(());
    }

    println!();
    println!(
        "{} within {} of {}",
        style(format!("{} pubs", pubs.len())).bold(),
        format_distance(f64::from(radius_m) / 1000.0),
        center
    );
    println!();
    for entry in &pubs {
        let place = &entry.place;
        println!(
            "  {} {}  {}",
            tier_badge(entry.tier),
            style(&place.name).bold(),
            style(format_distance(entry.distance_km)).dim()
        );
        let open = match place.open_now {
            Some(true) => style("open").green().to_string(),
            Some(false) => style("closed").red().to_string(),
            None => String::new(),
        };
        println!(
            "      crowd {}  {}  {}",
            entry.crowd_count,
            places::format_rating(place.rating),
            open
        );
        match &place.id {
            Some(id) => println!("      id {}", style(id).dim()),
            None => println!("      {}", style("no identifier, check-ins unavailable").dim()),
        }
        if let Some(reference) = &place.photo_reference {
            println!(
                "      photo {}",
                style(client.photo_url(reference, PREVIEW_PHOTO_WIDTH)).dim()
            );
        }
    }
    if pubs.is_empty() {
        println!("  No pubs found.");
    }
    println!();
    Ok(())
}

pub async fn cmd_details(cli: &Cli, place_id: &str, json: bool) -> Result<()> {
    if place_id.trim().is_empty() {
        anyhow::bail!("Invalid pub");
    }
    let config = load_config(cli)?;
    let client = config.places_client()?;

    let details = match client.details(place_id).await {
        Ok(Some(details)) => details,
        Ok(None) => anyhow::bail!("Pub not found"),
        Err(e) => {
            tracing::warn!(place_id, error = %e, "place details request failed");
            anyhow::bail!("Failed to load pub details");
        }
    };

    let crowd_count = match open_sync(&config) {
        Ok(sync) => sync.crowd_count_or_zero(place_id).await,
        Err(e) => {
            tracing::warn!(error = %e, "check-in store unavailable, showing zero");
            0
        }
    };

    if json {
        let value = serde_json::json!({
            "details": details,
            "crowd_count": crowd_count,
            "tier": CrowdTier::from_count(crowd_count),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialize details")?
        );
        return Ok(());
    }

    println!();
    println!("{}", style(&details.name).bold());
    if let Some(address) = &details.formatted_address {
        println!("  {}", address);
    }
    println!();
    println!(
        "  {}  {}  {} crowd {}",
        places::format_rating(details.rating),
        places::format_price_level(details.price_level),
        tier_badge(CrowdTier::from_count(crowd_count)),
        crowd_count
    );
    if let Some(phone) = &details.phone {
        println!("  Phone:   {}", phone);
    }
    if let Some(website) = &details.website {
        println!("  Website: {}", website);
    }
    if !details.opening_hours.is_empty() {
        println!();
        println!("  {}", style("Opening hours").underlined());
        for line in &details.opening_hours {
            println!("    {}", line);
        }
    }
    if let Some(location) = details.location {
        println!();
        println!(
            "  Directions: {}",
            places::directions_url(location, Some(&details.name))
        );
    }
    for reference in &details.photo_references {
        println!(
            "  Photo: {}",
            style(client.photo_url(reference, DETAIL_PHOTO_WIDTH)).dim()
        );
    }
    println!();
    Ok(())
}

pub(crate) fn tier_badge(tier: CrowdTier) -> String {
    let badge = format!("[{}]", tier.level());
    match tier {
        CrowdTier::Frozen => style(badge).cyan().to_string(),
        CrowdTier::Cold => style(badge).blue().to_string(),
        CrowdTier::Warm => style(badge).yellow().to_string(),
        CrowdTier::Hot => style(badge).red().to_string(),
        CrowdTier::OnFire => style(badge).red().bold().to_string(),
    }
}
