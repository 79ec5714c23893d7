//! Tag catalogue offered to users when describing a pub.
//!
//! The store accepts any tag; this list only drives what gets suggested.

/// Categories in display order, each with its tags in display order.
pub const TAG_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Music & Atmosphere",
        &[
            "Traditional Irish",
            "Live Band",
            "DJ/Electronic",
            "Rock",
            "Pop",
            "Karaoke",
            "Alternative",
            "Queer",
        ],
    ),
    ("Crowd Age", &["18–24", "25–34", "35–49", "50+"]),
    (
        "Perks & Features",
        &[
            "Drink promos",
            "Free snacks",
            "Outdoor seating",
            "TV Sports",
            "Dog-friendly",
            "Wheelchair accessible",
        ],
    ),
    ("Vibe", &["Cozy", "Loud", "Dance floor"]),
];

/// Category a catalogue tag belongs to (case-insensitive).
pub fn category_of(tag: &str) -> Option<&'static str> {
    TAG_CATEGORIES
        .iter()
        .find(|(_, tags)| tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim())))
        .map(|(category, _)| *category)
}

/// The catalogue spelling of a tag, if it is in the catalogue.
pub fn canonical(tag: &str) -> Option<&'static str> {
    TAG_CATEGORIES
        .iter()
        .flat_map(|(_, tags)| tags.iter())
        .find(|t| t.eq_ignore_ascii_case(tag.trim()))
        .copied()
}

pub fn all_tags() -> impl Iterator<Item = &'static str> {
    TAG_CATEGORIES.iter().flat_map(|(_, tags)| tags.iter().copied())
}
