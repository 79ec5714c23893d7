//! Static reference output — `craic tiers`, `craic catalogue`.

use console::style;

use craic::checkin::tags::{TAG_CATEGORIES, all_tags};
use craic::crowd::CrowdTier;

pub fn cmd_tiers() {
    println!();
    println!("{}", style("Crowd tiers").bold());
    println!();
    for tier in CrowdTier::ALL {
        let range = match tier.range() {
            (low, Some(high)) => format!("{low}–{high}"),
            (low, None) => format!("{low}+"),
        };
        println!("  {}  {:<8} {}", tier.level(), tier.label(), style(range).dim());
    }
    println!();
}

pub fn cmd_catalogue() {
    for (category, tags) in TAG_CATEGORIES {
        println!();
        println!("{}", style(category).bold());
        for tag in *tags {
            println!("  - {}", tag);
        }
    }
    println!();
    println!(
        "{}",
        style(format!(
            "{} tags in {} categories. Any other tag is accepted too.",
            all_tags().count(),
            TAG_CATEGORIES.len()
        ))
        .dim()
    );
    println!();
}
