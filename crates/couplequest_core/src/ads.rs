//! crates/couplequest_core/src/ads.rs
//!
//! Picks a promotional card for the user's location from a small static
//! catalog. There is no ad network behind this.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::OnceLock;
use tracing::debug;

use crate::domain::Ad;

fn ad(
    id: &str,
    advertiser: &str,
    headline: &str,
    description: &str,
    image_seed: &str,
    call_to_action: &str,
    locations: Option<&[&str]>,
) -> Ad {
    Ad {
        id: id.to_string(),
        advertiser: advertiser.to_string(),
        headline: headline.to_string(),
        description: description.to_string(),
        image_url: format!("https://picsum.photos/seed/{}/200/200", image_seed),
        call_to_action: call_to_action.to_string(),
        url: "#".to_string(),
        locations: locations.map(|tags| tags.iter().map(|t| t.to_string()).collect()),
    }
}

/// The built-in catalog.
pub fn catalog() -> &'static [Ad] {
    static CATALOG: OnceLock<Vec<Ad>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        vec![
            ad(
                "ad-101",
                "Gourmet Burger Bar",
                "Half-Price Burgers on Tuesdays!",
                "The juiciest, most flavorful burgers in town. Perfect for a casual date night.",
                "burgers",
                "View Menu",
                Some(&["San Francisco", "san francisco ca", "94105"]),
            ),
            ad(
                "ad-102",
                "City Kayak Rentals",
                "Explore the Bay by Kayak",
                "A romantic and adventurous way to see the city skyline from the water.",
                "kayak",
                "Book Now",
                Some(&["San Francisco", "san francisco ca"]),
            ),
            ad(
                "ad-201",
                "Starlight Drive-In",
                "Movie Night Under the Stars",
                "Cuddle up and enjoy a classic film from the comfort of your car.",
                "drivein",
                "See Showtimes",
                Some(&["Austin"]),
            ),
            ad(
                "ad-901",
                "CrateJoy",
                "The Perfect Date Night, Delivered.",
                "Get a curated box of activities, snacks, and everything you need for a fun night in.",
                "datebox",
                "Learn More",
                None,
            ),
            ad(
                "ad-902",
                "MasterClass",
                "Learn a New Skill Together",
                "Take a cooking, painting, or mixology class online from the world's best.",
                "class",
                "Explore Classes",
                None,
            ),
        ]
    })
}

/// Picks an ad from the built-in catalog.
pub fn pick_ad<R: Rng + ?Sized>(location: &str, rng: &mut R) -> Option<&'static Ad> {
    pick_ad_from(catalog(), location, rng)
}

/// Targeted ads win when one of their tags occurs (case-insensitively) in
/// `location`; otherwise an untagged ad is chosen. Picks are uniform.
pub fn pick_ad_from<'a, R: Rng + ?Sized>(
    ads: &'a [Ad],
    location: &str,
    rng: &mut R,
) -> Option<&'a Ad> {
    let location = location.to_lowercase();

    let targeted: Vec<&Ad> = ads
        .iter()
        .filter(|ad| {
            ad.locations.as_ref().is_some_and(|tags| {
                tags.iter().any(|tag| location.contains(&tag.to_lowercase()))
            })
        })
        .collect();
    if let Some(chosen) = targeted.choose(rng) {
        debug!(ad_id = %chosen.id, "Picked a location-targeted ad.");
        return Some(*chosen);
    }

    let generic: Vec<&Ad> = ads.iter().filter(|ad| ad.locations.is_none()).collect();
    generic.choose(rng).copied()
}
