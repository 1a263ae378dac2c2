//! crates/couplequest_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These types carry their own JSON shape (the one stored on the device and
//! exchanged with the idea endpoint) but know nothing about storage or HTTP.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// How many of the newest history titles are sent as "avoid these" context.
pub const RECENT_TITLE_LIMIT: usize = 20;

//=========================================================================================
// Validation Errors
//=========================================================================================

/// Input problems rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your email address.")]
    MissingEmail,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Please tell us about your shared interests.")]
    MissingInterests,
    #[error("Please enter a city or postal code.")]
    EmptyLocation,
    #[error("No user is signed in.")]
    NotSignedIn,
    #[error("Invalid date idea: {0}")]
    InvalidIdea(String),
}

//=========================================================================================
// Identity
//=========================================================================================

fn email_shape() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"))
}

/// The signed-in user. Only the shape of the e-mail address is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn parse(email: &str) -> Result<Self, ValidationError> {
        if email.is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if !email_shape().is_match(email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(Self(email.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//=========================================================================================
// Profile
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Budget {
    Free,
    #[serde(rename = "$")]
    Low,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    High,
}

impl Budget {
    pub const ALL: [Budget; 4] = [Budget::Free, Budget::Low, Budget::Moderate, Budget::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Free => "Free",
            Budget::Low => "$",
            Budget::Moderate => "$$",
            Budget::High => "$$$",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Availability {
    Weekdays,
    Weekends,
    Anytime,
}

impl Availability {
    pub const ALL: [Availability; 3] = [
        Availability::Weekdays,
        Availability::Weekends,
        Availability::Anytime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Weekdays => "Weekdays",
            Availability::Weekends => "Weekends",
            Availability::Anytime => "Anytime",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a couple told us about themselves on the setup screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub interests: String,
    pub preferred_budget: Vec<Budget>,
    pub availability: Vec<Availability>,
}

impl UserProfile {
    /// Builds a profile, dropping repeated budget and availability choices.
    pub fn new(
        interests: impl Into<String>,
        preferred_budget: impl IntoIterator<Item = Budget>,
        availability: impl IntoIterator<Item = Availability>,
    ) -> Self {
        Self {
            interests: interests.into(),
            preferred_budget: dedup(preferred_budget),
            availability: dedup(availability),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interests.trim().is_empty() {
            return Err(ValidationError::MissingInterests);
        }
        Ok(())
    }
}

impl Default for UserProfile {
    /// The selections the setup form starts with.
    fn default() -> Self {
        Self::new(
            String::new(),
            [Budget::Low, Budget::Moderate],
            [Availability::Anytime],
        )
    }
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

//=========================================================================================
// Date Ideas
//=========================================================================================

/// The eight categories the upstream model may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Outdoor,
    Dining,
    #[serde(rename = "At-Home")]
    AtHome,
    Creative,
    Romantic,
    Adventure,
    Wellness,
    Entertainment,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Outdoor,
        Category::Dining,
        Category::AtHome,
        Category::Creative,
        Category::Romantic,
        Category::Adventure,
        Category::Wellness,
        Category::Entertainment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Outdoor => "Outdoor",
            Category::Dining => "Dining",
            Category::AtHome => "At-Home",
            Category::Creative => "Creative",
            Category::Romantic => "Romantic",
            Category::Adventure => "Adventure",
            Category::Wellness => "Wellness",
            Category::Entertainment => "Entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated suggestion before it has been stamped with an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaDraft {
    pub title: String,
    pub description: String,
    pub budget: Budget,
    pub time_required: String,
    pub couple_benefit: String,
    pub category: Category,
    pub is_local: bool,
    pub location_details: String,
}

impl IdeaDraft {
    /// Parses model output and checks it against the declared schema.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let draft: IdeaDraft = serde_json::from_str(text.trim())
            .map_err(|e| ValidationError::InvalidIdea(e.to_string()))?;
        check_text("title", &draft.title)?;
        Ok(draft)
    }

    pub fn into_idea(self, id: String) -> DateIdea {
        DateIdea {
            id,
            title: self.title,
            description: self.description,
            budget: self.budget,
            time_required: self.time_required,
            couple_benefit: self.couple_benefit,
            category: self.category,
            is_local: self.is_local,
            location_details: self.location_details,
        }
    }
}

/// A single suggestion as shown on the main card and kept in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateIdea {
    pub id: String,
    pub title: String,
    pub description: String,
    pub budget: Budget,
    pub time_required: String,
    pub couple_benefit: String,
    pub category: Category,
    pub is_local: bool,
    pub location_details: String,
}

impl DateIdea {
    /// Parses an idea returned by the idea endpoint, id included.
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        let idea: DateIdea = serde_json::from_str(text.trim())
            .map_err(|e| ValidationError::InvalidIdea(e.to_string()))?;
        check_text("id", &idea.id)?;
        check_text("title", &idea.title)?;
        Ok(idea)
    }
}

fn check_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidIdea(format!("`{}` is empty", field)));
    }
    Ok(())
}

/// Idea ids are the generation instant in ISO-8601 with milliseconds, e.g.
/// `2024-01-01T00:00:00.000Z`.
pub fn idea_id_at(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

//=========================================================================================
// Location & Distance
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationCoords {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationCoords {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        Some(Self { latitude, longitude })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistancePreference {
    Local,
    DayTrip,
    #[default]
    Any,
}

impl DistancePreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "day_trip" | "day-trip" | "daytrip" => Some(Self::DayTrip),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

//=========================================================================================
// Idea Request (wire payload of the idea endpoint)
//=========================================================================================

/// Everything the idea endpoint needs to produce one suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaRequest {
    pub profile: UserProfile,
    #[serde(default)]
    pub location: Option<LocationCoords>,
    #[serde(default)]
    pub manual_location: String,
    #[serde(default)]
    pub recent_titles: String,
    #[serde(default)]
    pub distance_preference: DistancePreference,
}

impl IdeaRequest {
    pub fn new(
        profile: UserProfile,
        location: Option<LocationCoords>,
        manual_location: impl Into<String>,
        history: &[DateIdea],
        distance_preference: DistancePreference,
    ) -> Self {
        Self {
            profile,
            location,
            manual_location: manual_location.into(),
            recent_titles: recent_titles(history),
            distance_preference,
        }
    }
}

/// Titles of the newest ideas (history is newest first), comma separated.
pub fn recent_titles(history: &[DateIdea]) -> String {
    history
        .iter()
        .take(RECENT_TITLE_LIMIT)
        .map(|idea| idea.title.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

//=========================================================================================
// Advertising
//=========================================================================================

/// A promotional record. Ads without `locations` are shown anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: String,
    pub advertiser: String,
    pub headline: String,
    pub description: String,
    pub image_url: String,
    pub call_to_action: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<String>>,
}
