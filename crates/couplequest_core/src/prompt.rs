//! crates/couplequest_core/src/prompt.rs
//!
//! Builds the natural-language prompt and the structured-output schema sent to
//! the generative model.

use serde_json::{json, Value};

use crate::domain::{Budget, Category, DistancePreference, IdeaRequest};

pub const SYSTEM_INSTRUCTIONS: &str = "You are CoupleQuest, a creative date planner. \
You always answer with a single JSON object that matches the provided schema and nothing else.";

fn location_clause(request: &IdeaRequest) -> String {
    if let Some(coords) = request.location {
        format!(
            "Their current location is approximately latitude {} and longitude {}. If you suggest a local activity (like a specific restaurant, park, or venue), make it near this location.",
            coords.latitude, coords.longitude
        )
    } else if !request.manual_location.trim().is_empty() {
        format!(
            "Their current location is near {}. If you suggest a local activity (like a specific restaurant, park, or venue), make it in or very close to this area.",
            request.manual_location.trim()
        )
    } else {
        "Since their location is unavailable, please prioritize universal activities that can be done anywhere. If you must suggest a local type of activity, do not name a specific business or address.".to_string()
    }
}

fn distance_clause(preference: DistancePreference) -> &'static str {
    match preference {
        DistancePreference::Local => {
            "The couple wants a date idea that is strictly local and very close to their specified location. Do not suggest anything that would require a long drive. The \"is_local\" flag in the response MUST be true."
        }
        DistancePreference::DayTrip => {
            "The couple is looking for a fun day trip. Suggest an activity that is within a 2-3 hour drive from their location. This should feel like a mini-adventure away from their home area. The \"is_local\" flag in the response MUST be true for this kind of suggestion as well, since it refers to a specific destination."
        }
        DistancePreference::Any => {
            "You have the freedom to suggest either a strictly local activity or a day trip that might be a few hours away. Surprise them!"
        }
    }
}

fn join<T: AsRef<str>>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the user message for one idea request.
pub fn build_prompt(request: &IdeaRequest) -> String {
    let profile = &request.profile;
    let avoid = if request.recent_titles.trim().is_empty() {
        "none"
    } else {
        request.recent_titles.trim()
    };

    format!(
        "A couple is looking for a date idea. Please generate a creative and engaging suggestion.

Their Profile:
- Interests: {interests}
- Preferred Budgets: {budgets}
- Availability: {availability}

Location context: {location}

Date Distance Preference: {distance}

To ensure variety, please AVOID suggesting ideas similar to these recent ones: {avoid}.

Generate one new, unique date idea that fits their profile, location, and distance preference.",
        interests = profile.interests.trim(),
        budgets = join(profile.preferred_budget.iter().map(|b| b.as_str())),
        availability = join(profile.availability.iter().map(|a| a.as_str())),
        location = location_clause(request),
        distance = distance_clause(request.distance_preference),
        avoid = avoid,
    )
}

/// JSON schema of one idea (without `id`) for structured output.
pub fn idea_json_schema() -> Value {
    let budgets: Vec<&str> = Budget::ALL.iter().map(|b| b.as_str()).collect();
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "A short, catchy title for the date idea (max 5 words)." },
            "description": { "type": "string", "description": "A one or two sentence description of the activity." },
            "budget": { "type": "string", "enum": budgets, "description": "A budget rating." },
            "time_required": { "type": "string", "description": "Estimated time for the date, e.g., '1-2 hours'." },
            "couple_benefit": { "type": "string", "description": "Why this activity is good for a couple's relationship." },
            "category": { "type": "string", "enum": categories, "description": "A single category for the activity." },
            "is_local": { "type": "boolean", "description": "True if this is a location-specific activity." },
            "location_details": { "type": "string", "description": "If local, the name of a specific place or address. Otherwise, an empty string." }
        },
        "required": ["title", "description", "budget", "time_required", "couple_benefit", "category", "is_local", "location_details"],
        "additionalProperties": false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, LocationCoords, UserProfile};

    fn request() -> IdeaRequest {
        IdeaRequest {
            profile: UserProfile::new(
                "hiking",
                [Budget::Low, Budget::Moderate],
                [Availability::Anytime],
            ),
            location: None,
            manual_location: String::new(),
            recent_titles: String::new(),
            distance_preference: DistancePreference::Any,
        }
    }

    #[test]
    fn embeds_profile_fields() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("- Interests: hiking"));
        assert!(prompt.contains("- Preferred Budgets: $, $$"));
        assert!(prompt.contains("- Availability: Anytime"));
        assert!(prompt.contains("recent ones: none."));
    }

    #[test]
    fn coordinates_take_priority_over_manual_text() {
        let mut req = request();
        req.manual_location = "Austin".into();
        req.location = LocationCoords::new(37.5, -122.25);
        let prompt = build_prompt(&req);
        assert!(prompt.contains("latitude 37.5 and longitude -122.25"));
        assert!(!prompt.contains("near Austin"));

        req.location = None;
        assert!(build_prompt(&req).contains("near Austin"));

        req.manual_location.clear();
        assert!(build_prompt(&req).contains("prioritize universal activities"));
    }

    #[test]
    fn distance_preference_changes_the_clause() {
        let mut req = request();
        req.distance_preference = DistancePreference::Local;
        assert!(build_prompt(&req).contains("strictly local"));
        req.distance_preference = DistancePreference::DayTrip;
        assert!(build_prompt(&req).contains("2-3 hour drive"));
        req.distance_preference = DistancePreference::Any;
        assert!(build_prompt(&req).contains("Surprise them!"));
    }

    #[test]
    fn recent_titles_are_listed_for_avoidance() {
        let mut req = request();
        req.recent_titles = "Sunset Hike, Pottery Class".into();
        assert!(build_prompt(&req).contains("recent ones: Sunset Hike, Pottery Class."));
    }

    #[test]
    fn schema_constrains_budget_and_category() {
        let schema = idea_json_schema();
        assert_eq!(schema["properties"]["budget"]["enum"].as_array().unwrap().len(), 4);
        assert_eq!(schema["properties"]["category"]["enum"].as_array().unwrap().len(), 8);
        assert_eq!(schema["required"].as_array().unwrap().len(), 8);
    }
}
