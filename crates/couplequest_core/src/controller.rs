//! crates/couplequest_core/src/controller.rs
//!
//! The single authority over which screen is shown and what data it works
//! with. Every user intent from the view layer lands here; the controller
//! persists through the `Store`, asks the geolocation and idea ports for new
//! data, and keeps at most one idea request in flight.

use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::ads;
use crate::domain::{
    Ad, DateIdea, DistancePreference, IdeaRequest, LocationCoords, UserIdentity, UserProfile,
    ValidationError,
};
use crate::ports::{GeolocationService, IdeaGenerationService, PortResult};
use crate::session::{GenerationPhase, Session, SessionError};
use crate::store::{keys, Store};

/// The screen the view layer should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Auth,
    ProfileSetup,
    Main,
}

/// What the main card area shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MainContent<'a> {
    Loading,
    Error(SessionError),
    Idea(&'a DateIdea),
    Empty,
}

/// A generation request that has been started but not yet applied.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    epoch: u64,
    request: IdeaRequest,
}

impl GenerationTicket {
    pub fn request(&self) -> &IdeaRequest {
        &self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated,
    Failed,
    /// The session changed while the request was in flight; the result was dropped.
    Discarded,
}

pub struct Controller {
    store: Store,
    ideas: Arc<dyn IdeaGenerationService>,
    geolocation: Arc<dyn GeolocationService>,
    session: Option<Session>,
    distance_preference: DistancePreference,
    /// Bumped whenever the session or its profile changes so late results can
    /// be recognised.
    epoch: u64,
}

impl Controller {
    /// Creates a controller, resuming the session of the persisted current user if any.
    pub fn new(
        store: Store,
        ideas: Arc<dyn IdeaGenerationService>,
        geolocation: Arc<dyn GeolocationService>,
    ) -> Self {
        let session = store.current_user().map(|user| {
            info!(user = %user, "Resuming stored session.");
            Session::load(&store, user)
        });
        let mut controller = Self {
            store,
            ideas,
            geolocation,
            session,
            distance_preference: DistancePreference::default(),
            epoch: 0,
        };
        controller.sync_displayed_idea();
        controller
    }

    //=====================================================================================
    // Read Accessors
    //=====================================================================================

    pub fn view(&self) -> View {
        match &self.session {
            None => View::Auth,
            Some(session) if session.profile.is_none() => View::ProfileSetup,
            Some(_) => View::Main,
        }
    }

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.as_ref().and_then(|s| s.profile.as_ref())
    }

    pub fn history(&self) -> &[DateIdea] {
        self.session
            .as_ref()
            .map(|s| s.history.as_slice())
            .unwrap_or(&[])
    }

    pub fn favorites(&self) -> &[DateIdea] {
        self.session
            .as_ref()
            .map(|s| s.favorites.as_slice())
            .unwrap_or(&[])
    }

    pub fn current_idea(&self) -> Option<&DateIdea> {
        self.session.as_ref().and_then(|s| s.current_idea.as_ref())
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == GenerationPhase::Generating
    }

    pub fn phase(&self) -> GenerationPhase {
        self.session.as_ref().map_or(GenerationPhase::Idle, |s| s.phase)
    }

    pub fn error(&self) -> Option<SessionError> {
        self.session.as_ref().and_then(|s| s.error)
    }

    pub fn location(&self) -> Option<LocationCoords> {
        self.session.as_ref().and_then(|s| s.location)
    }

    pub fn manual_location_query(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.manual_location_query.as_str())
    }

    pub fn manual_location_input(&self) -> &str {
        self.session.as_ref().map_or("", |s| s.manual_location_input.as_str())
    }

    pub fn distance_preference(&self) -> DistancePreference {
        self.distance_preference
    }

    pub fn is_favorited(&self, idea_id: &str) -> bool {
        self.favorites().iter().any(|fav| fav.id == idea_id)
    }

    /// True when the manual-location form replaces the error banner.
    pub fn show_location_form(&self) -> bool {
        self.error().is_some_and(|e| e.is_location_error())
    }

    pub fn main_content(&self) -> MainContent<'_> {
        if self.is_loading() {
            return MainContent::Loading;
        }
        if let Some(err) = self.error().filter(|e| !e.is_location_error()) {
            return MainContent::Error(err);
        }
        match self.current_idea() {
            Some(idea) => MainContent::Idea(idea),
            None => MainContent::Empty,
        }
    }

    /// An ad for the manually entered location (generic when there is none).
    pub fn current_ad<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static Ad> {
        ads::pick_ad(self.manual_location_query(), rng)
    }

    //=====================================================================================
    // Identity
    //=====================================================================================

    pub fn login(&mut self, email: &str) -> Result<(), ValidationError> {
        let user = UserIdentity::parse(email)?;
        info!(user = %user, "User signed in.");
        self.store.save(keys::CURRENT_USER, &user);
        self.epoch += 1;
        self.session = Some(Session::load(&self.store, user));
        self.sync_displayed_idea();
        Ok(())
    }

    /// Signs out. The user's stored profile, history and favourites stay in
    /// the store and come back on the next sign-in.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!(user = %session.user, "User signed out.");
        }
        self.store.remove(keys::CURRENT_USER);
        self.epoch += 1;
    }

    //=====================================================================================
    // Profile
    //=====================================================================================

    /// Stores the profile, asks for the current position and then generates
    /// the first idea.
    pub async fn save_profile(&mut self, profile: UserProfile) -> Result<(), ValidationError> {
        profile.validate()?;
        let session = self.session.as_mut().ok_or(ValidationError::NotSignedIn)?;
        self.store.save(&keys::profile(&session.user), &profile);
        session.profile = Some(profile);
        session.current_idea = None;
        if session.phase == GenerationPhase::Generating {
            warn!(user = %session.user, "Profile replaced while an idea was in flight.");
        }
        session.phase = GenerationPhase::AwaitingFirstGeneration;
        // Results requested with the previous profile must not land in history.
        self.epoch += 1;
        debug!(user = %session.user, "Profile saved, first idea pending.");

        self.request_location().await;
        self.settle().await;
        Ok(())
    }

    /// Clears the profile so the setup screen is shown again. History and
    /// favourites are kept.
    pub fn reset_profile(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.store.remove(&keys::profile(&session.user));
        session.profile = None;
        session.current_idea = None;
        session.error = None;
        session.phase = GenerationPhase::Idle;
        self.epoch += 1;
        info!(user = %session.user, "Profile reset.");
    }

    //=====================================================================================
    // Location
    //=====================================================================================

    pub async fn request_location(&mut self) {
        if self.session.is_none() {
            return;
        }
        let epoch = self.epoch;
        let result = self.geolocation.current_position().await;
        self.apply_location(epoch, result);
    }

    fn apply_location(&mut self, epoch: u64, result: PortResult<LocationCoords>) {
        if epoch != self.epoch {
            debug!("Ignoring a position that arrived after the session changed.");
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match result {
            Ok(coords) => {
                debug!(latitude = coords.latitude, longitude = coords.longitude, "Position acquired.");
                session.location = Some(coords);
                if session.error.is_some_and(|e| e.is_location_error()) {
                    session.error = None;
                }
                // A fresh fix wins over whatever city was typed in.
                session.manual_location_query.clear();
            }
            Err(e) => {
                warn!(error = %e, "Position unavailable, asking for a manual location.");
                session.error = Some(SessionError::LocationDenied);
            }
        }
    }

    pub fn set_manual_location_input(&mut self, text: &str) {
        if let Some(session) = self.session.as_mut() {
            session.manual_location_input = text.to_string();
        }
    }

    /// Submits whatever is in the manual-location input field.
    pub fn submit_manual_location(&mut self) -> Result<(), ValidationError> {
        let input = self.manual_location_input().to_string();
        self.set_manual_location(&input)
    }

    pub fn set_manual_location(&mut self, text: &str) -> Result<(), ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyLocation);
        }
        let session = self.session.as_mut().ok_or(ValidationError::NotSignedIn)?;
        session.manual_location_query = trimmed.to_string();
        session.error = None;
        session.manual_location_input.clear();
        debug!(location = trimmed, "Manual location committed.");
        Ok(())
    }

    pub fn set_distance_preference(&mut self, preference: DistancePreference) {
        self.distance_preference = preference;
    }

    //=====================================================================================
    // Idea Generation
    //=====================================================================================

    /// Generates a new idea unless there is no profile or one is already on its way.
    pub async fn generate_idea(&mut self) -> Option<GenerationOutcome> {
        let ticket = self.begin_generation()?;
        let outcome = self.ideas.generate(ticket.request()).await;
        Some(self.complete_generation(ticket, outcome))
    }

    /// Starts a generation. Returns `None` (and changes nothing) when there is
    /// no profile or a request is already in flight.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        let epoch = self.epoch;
        let distance = self.distance_preference;
        let session = self.session.as_mut()?;
        if session.phase == GenerationPhase::Generating {
            debug!("Generation already in flight, ignoring request.");
            return None;
        }
        let profile = session.profile.clone()?;

        session.phase = GenerationPhase::Generating;
        session.error = None;
        session.current_idea = None;

        let request = IdeaRequest::new(
            profile,
            session.location,
            session.manual_location_query.clone(),
            &session.history,
            distance,
        );
        Some(GenerationTicket { epoch, request })
    }

    /// Applies the result of a generation started with [`Self::begin_generation`].
    pub fn complete_generation(
        &mut self,
        ticket: GenerationTicket,
        outcome: PortResult<DateIdea>,
    ) -> GenerationOutcome {
        if ticket.epoch != self.epoch {
            warn!("Discarding an idea for a session that has since changed.");
            return GenerationOutcome::Discarded;
        }
        let Some(session) = self.session.as_mut() else {
            return GenerationOutcome::Discarded;
        };
        session.phase = GenerationPhase::Idle;

        match outcome {
            Ok(idea) => {
                info!(idea_id = %idea.id, title = %idea.title, "Generated a new date idea.");
                session.history.insert(0, idea.clone());
                session.current_idea = Some(idea);
                self.store.save(&keys::history(&session.user), &session.history);
                GenerationOutcome::Generated
            }
            Err(e) => {
                error!(error = %e, "Date idea generation failed.");
                session.error = Some(SessionError::GenerationFailed);
                session.current_idea = session.history.first().cloned();
                GenerationOutcome::Failed
            }
        }
    }

    /// Runs whichever follow-up the current state calls for: the pending first
    /// generation after a profile save, or otherwise the history sync.
    pub async fn settle(&mut self) {
        let awaiting = self.session.as_ref().is_some_and(|s| {
            s.phase == GenerationPhase::AwaitingFirstGeneration && s.profile.is_some()
        });
        if awaiting {
            self.generate_idea().await;
        } else {
            self.sync_displayed_idea();
        }
    }

    /// Keeps the card in step with history while nothing is pending.
    pub fn sync_displayed_idea(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase != GenerationPhase::Idle {
            return;
        }
        if session.history.is_empty() {
            session.current_idea = None;
        } else if session.current_idea.is_none() {
            session.current_idea = session.history.first().cloned();
        }
    }

    //=====================================================================================
    // Favourites & Selection
    //=====================================================================================

    /// Adds or removes an idea from favourites. Returns whether it is a
    /// favourite afterwards; unknown ids change nothing.
    pub fn toggle_favorite(&mut self, idea_id: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let favorited = if session.favorites.iter().any(|fav| fav.id == idea_id) {
            session.favorites.retain(|fav| fav.id != idea_id);
            false
        } else {
            let Some(idea) = session.find_idea(idea_id).cloned() else {
                debug!(idea_id, "Cannot favourite an idea that is not in history.");
                return false;
            };
            session.favorites.insert(0, idea);
            true
        };
        self.store.save(&keys::favorites(&session.user), &session.favorites);
        favorited
    }

    /// Shows an idea picked from the history or favourites panel.
    pub fn select_idea(&mut self, idea_id: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let picked = session
            .find_idea(idea_id)
            .or_else(|| session.favorites.iter().find(|fav| fav.id == idea_id))
            .cloned();
        match picked {
            Some(idea) => {
                session.current_idea = Some(idea);
                true
            }
            None => false,
        }
    }
}
