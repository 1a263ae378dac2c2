//! crates/couplequest_core/src/session.rs
//!
//! The state belonging to one signed-in identity. A `Session` is built from
//! the store when a user signs in and dropped when they sign out, so nothing
//! from a previous identity survives a switch.

use crate::domain::{DateIdea, LocationCoords, UserIdentity, UserProfile};
use crate::store::{keys, Store};

/// Message shown when the position lookup fails. The view layer swaps the
/// error banner for a manual-location form when an error starts with
/// [`LOCATION_ERROR_PREFIX`].
pub const LOCATION_DENIED_MESSAGE: &str = "Location access denied. Enter your city for local ideas.";
pub const LOCATION_ERROR_PREFIX: &str = "Location access";
pub const GENERATION_FAILED_MESSAGE: &str = "Oops! Couldn't generate an idea. Please try again.";

/// Errors surfaced to the view. Neither is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("{}", LOCATION_DENIED_MESSAGE)]
    LocationDenied,
    #[error("{}", GENERATION_FAILED_MESSAGE)]
    GenerationFailed,
}

impl SessionError {
    pub fn is_location_error(&self) -> bool {
        self.to_string().starts_with(LOCATION_ERROR_PREFIX)
    }
}

/// Where idea generation stands for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPhase {
    #[default]
    Idle,
    /// A profile was just saved; the next settle generates the first idea.
    AwaitingFirstGeneration,
    Generating,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) user: UserIdentity,
    pub(crate) profile: Option<UserProfile>,
    pub(crate) history: Vec<DateIdea>,
    pub(crate) favorites: Vec<DateIdea>,
    pub(crate) current_idea: Option<DateIdea>,
    pub(crate) error: Option<SessionError>,
    pub(crate) location: Option<LocationCoords>,
    pub(crate) manual_location_input: String,
    pub(crate) manual_location_query: String,
    pub(crate) phase: GenerationPhase,
}

impl Session {
    /// Loads the profile, history and favourites stored for `user`.
    pub(crate) fn load(store: &Store, user: UserIdentity) -> Self {
        let profile = store.load(&keys::profile(&user), None);
        let history = store.load(&keys::history(&user), Vec::new());
        let favorites = store.load(&keys::favorites(&user), Vec::new());
        Self {
            user,
            profile,
            history,
            favorites,
            current_idea: None,
            error: None,
            location: None,
            manual_location_input: String::new(),
            manual_location_query: String::new(),
            phase: GenerationPhase::Idle,
        }
    }

    pub(crate) fn find_idea(&self, id: &str) -> Option<&DateIdea> {
        self.history
            .iter()
            .find(|idea| idea.id == id)
            .or_else(|| self.current_idea.as_ref().filter(|idea| idea.id == id))
    }
}
