//! Check-in commands — `craic show`, `craic checkin`, `craic tags`.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use console::style;

use craic::checkin::tags::{canonical, category_of};
use craic::checkin::{CheckInSession, Intent};
use craic::crowd::CrowdTier;
use craic::errors::CheckInAction;

use super::places::tier_badge;
use super::{load_config, open_sync};
use crate::Cli;

/// Trim tags and use the catalogue spelling where one exists.
pub(crate) fn normalize_tags(tags: &[String]) -> BTreeSet<String> {
    tags.iter()
        .map(|tag| canonical(tag).map(str::to_string).unwrap_or_else(|| tag.trim().to_string()))
        .filter(|tag| !tag.is_empty())
        .inspect(|tag| match category_of(tag) {
            Some(category) => tracing::debug!(tag = %tag, category, "catalogue tag"),
            None => tracing::debug!(tag = %tag, "custom tag"),
        })
        .collect()
}

pub async fn cmd_show(cli: &Cli, place_id: &str, json: bool) -> Result<()> {
    let config = load_config(cli)?;
    let sync = open_sync(&config)?;

    let record = sync.fetch_check_in_state(place_id).await.map_err(|e| {
        tracing::warn!(place_id, error = %e, "failed to fetch check-in state");
        anyhow::anyhow!(e.user_message(CheckInAction::Load))
    })?;

    if json {
        let value = serde_json::json!({
            "place_id": place_id,
            "record": record,
            "tier": CrowdTier::from_count(record.as_ref().map_or(0, |r| r.crowd_count)),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialize record")?
        );
        return Ok(());
    }

    println!();
    let Some(record) = record else {
        println!("No check-ins yet for {}", style(place_id).bold());
        println!("  crowd 0 {}", tier_badge(CrowdTier::Frozen));
        println!();
        return Ok(());
    };

    println!("{}", style(place_id).bold());
    println!(
        "  crowd {} {} {}",
        record.crowd_count,
        tier_badge(record.tier()),
        record.tier()
    );
    if record.tags.is_empty() {
        println!("  tags: {}", style("none").dim());
    } else {
        let tags: Vec<&str> = record.tags.iter().map(String::as_str).collect();
        println!("  tags: {}", tags.join(", "));
    }
    let popular = record.popular_tags();
    if !popular.is_empty() {
        println!();
        println!("  {}", style("All-time tag votes").underlined());
        for (tag, count) in popular {
            println!("    {:>4}  {}", count, tag);
        }
    }
    if let Some(updated_at) = record.updated_at {
        println!();
        println!(
            "  {}",
            style(format!("tags updated {}", updated_at.format("%Y-%m-%d %H:%M UTC"))).dim()
        );
    }
    println!();
    Ok(())
}

pub async fn cmd_checkin(cli: &Cli, place_id: &str, tags: &[String]) -> Result<()> {
    let config = load_config(cli)?;
    let sync = open_sync(&config)?;

    let mut session = CheckInSession::open(sync.clone(), Some(place_id)).await;
    if session.state().place_id.is_none() {
        anyhow::bail!("Invalid pub");
    }
    let load_failed = session.state().error.is_some();
    if let Some(message) = session.state().error {
        eprintln!("{} {}", style("warning:").yellow(), message);
    }

    let state = session.dispatch(Intent::CheckIn).await;
    if state.error == Some(CheckInAction::RegisterCheckIn.failure_message()) {
        anyhow::bail!(CheckInAction::RegisterCheckIn.failure_message());
    }
    // The local count started from zero; ask the store instead.
    let crowd = if load_failed {
        match sync.fetch_check_in_state(place_id).await {
            Ok(Some(record)) => Some(record.crowd_count),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(place_id, error = %e, "crowd count unavailable after check-in");
                None
            }
        }
    } else {
        Some(state.crowd_count)
    };
    println!("{}", check_in_message(place_id, crowd));

    let tags = normalize_tags(tags);
    if !tags.is_empty() {
        let state = session.dispatch(Intent::ReplaceTags(tags)).await;
        if state.error == Some(CheckInAction::SaveTags.failure_message()) {
            anyhow::bail!(CheckInAction::SaveTags.failure_message());
        }
        let saved: Vec<&str> = state.selected_tags.iter().map(String::as_str).collect();
        println!("{} Tagged: {}", style("✓").green(), saved.join(", "));
    }
    Ok(())
}

/// Confirmation line; the crowd is left out when it is not known.
pub(crate) fn check_in_message(place_id: &str, crowd: Option<u64>) -> String {
    let mut message = format!("{} Checked in to {}.", style("✓").green(), style(place_id).bold());
    if let Some(count) = crowd {
        message.push_str(&format!(
            " Crowd now {} {}",
            count,
            tier_badge(CrowdTier::from_count(count))
        ));
    }
    message
}

pub async fn cmd_tags(cli: &Cli, place_id: &str, tags: &[String]) -> Result<()> {
    let config = load_config(cli)?;
    let sync = open_sync(&config)?;

    let tags = normalize_tags(tags);
    sync.submit_tags(place_id, &tags).await.map_err(|e| {
        tracing::warn!(place_id, error = %e, "failed to submit tags");
        anyhow::anyhow!(e.user_message(CheckInAction::SaveTags))
    })?;

    if tags.is_empty() {
        println!("{} Cleared tags for {}", style("✓").green(), style(place_id).bold());
    } else {
        let saved: Vec<&str> = tags.iter().map(String::as_str).collect();
        println!(
            "{} Tagged {}: {}",
            style("✓").green(),
            style(place_id).bold(),
            saved.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_in_message_with_known_crowd() {
        let message = console::strip_ansi_codes(&check_in_message("kehoes", Some(37))).to_string();
        assert!(message.contains("Checked in to kehoes."));
        assert!(message.contains("Crowd now 37"));
        assert!(message.contains("[4]"));
    }

    #[test]
    fn test_check_in_message_without_crowd_omits_count() {
        let message = console::strip_ansi_codes(&check_in_message("kehoes", None)).to_string();
        assert!(message.contains("Checked in to kehoes."));
        assert!(!message.contains("Crowd now"));
    }

    #[test]
    fn test_normalize_tags_uses_catalogue_spelling() {
        let tags = normalize_tags(&[
            "loud".to_string(),
            " Loud ".to_string(),
            "".to_string(),
            "Snug bar".to_string(),
        ]);
        let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["Loud", "Snug bar"]);
    }
}
