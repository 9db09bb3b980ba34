//! Query normalization, destination extraction and the locality filter

use super::types::HotelItem;

/// Words after which a destination usually follows
const DESTINATION_MARKERS: &[&str] = &["in", "near", "around", "at", "to", "visiting"];

/// Words that end a destination phrase
const DESTINATION_STOPS: &[&str] = &[
    "for", "with", "under", "below", "from", "this", "next", "on", "during", "that", "which",
    "and", "please",
];

/// Lowercase, trim and collapse inner whitespace
pub fn normalize_query(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Destination named in a free-text query, e.g. "hotels in Cancun" -> "Cancun".
///
/// Takes the words after the last location marker up to the first stop word.
pub fn extract_destination(query: &str) -> Option<String> {
    let words: Vec<&str> = query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\''))
        .filter(|w| !w.is_empty())
        .collect();

    let marker = words
        .iter()
        .rposition(|w| DESTINATION_MARKERS.contains(&w.to_lowercase().as_str()))?;

    let destination: Vec<&str> = words[marker + 1..]
        .iter()
        .copied()
        .take_while(|w| !DESTINATION_STOPS.contains(&w.to_lowercase().as_str()))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .collect();

    if destination.is_empty() {
        return None;
    }

    Some(
        destination
            .iter()
            .map(|w| capitalize(w))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Case-insensitive containment in either direction
fn loosely_matches(candidate: &str, target: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    if candidate.is_empty() {
        return false;
    }
    candidate.contains(target) || target.contains(&candidate)
}

/// Whether `hotel` is located in `destination`
pub fn matches_location(hotel: &HotelItem, destination: &str) -> bool {
    let target = destination.trim().to_lowercase();
    if target.is_empty() {
        return true;
    }

    [&hotel.city, &hotel.address]
        .into_iter()
        .flatten()
        .any(|field| loosely_matches(field, &target))
}

/// Hotels located in `destination`, relevance order kept
pub fn filter_by_location(hotels: &[HotelItem], destination: &str) -> Vec<HotelItem> {
    hotels
        .iter()
        .filter(|hotel| matches_location(hotel, destination))
        .cloned()
        .collect()
}
