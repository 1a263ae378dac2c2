use async_trait::async_trait;
use couplequest_core::store::keys;
use couplequest_core::{
    Availability, Budget, Category, Controller, DateIdea, DistancePreference, GenerationOutcome,
    GenerationPhase, GeolocationService, IdeaDraft, IdeaGenerationService, IdeaRequest,
    InMemoryStore, KeyValueStore, LocationCoords, MainContent, PortError, PortResult,
    SessionError, Store, UserIdentity, UserProfile, ValidationError, View,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

//=========================================================================================
// Stub Ports
//=========================================================================================

#[derive(Default)]
struct ScriptedIdeas {
    responses: Mutex<VecDeque<PortResult<DateIdea>>>,
    requests: Mutex<Vec<IdeaRequest>>,
}

impl ScriptedIdeas {
    fn push_ok(&self, idea: DateIdea) {
        self.responses.lock().unwrap().push_back(Ok(idea));
    }

    fn push_err(&self) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(PortError::Unavailable("upstream returned 500".into())));
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> IdeaRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl IdeaGenerationService for ScriptedIdeas {
    async fn generate(&self, request: &IdeaRequest) -> PortResult<DateIdea> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unavailable("no scripted response".into())))
    }
}

struct SwitchableGeolocation {
    position: Mutex<Option<LocationCoords>>,
}

impl SwitchableGeolocation {
    fn denied() -> Self {
        Self { position: Mutex::new(None) }
    }

    fn at(latitude: f64, longitude: f64) -> Self {
        Self { position: Mutex::new(LocationCoords::new(latitude, longitude)) }
    }

    fn set(&self, position: Option<LocationCoords>) {
        *self.position.lock().unwrap() = position;
    }
}

#[async_trait]
impl GeolocationService for SwitchableGeolocation {
    async fn current_position(&self) -> PortResult<LocationCoords> {
        self.position
            .lock()
            .unwrap()
            .ok_or_else(|| PortError::PermissionDenied("User denied Geolocation".into()))
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

struct Fixture {
    backend: Arc<InMemoryStore>,
    ideas: Arc<ScriptedIdeas>,
    geolocation: Arc<SwitchableGeolocation>,
    controller: Controller,
}

impl Fixture {
    fn new(geolocation: SwitchableGeolocation) -> Self {
        Self::with_backend(Arc::new(InMemoryStore::new()), geolocation)
    }

    fn with_backend(backend: Arc<InMemoryStore>, geolocation: SwitchableGeolocation) -> Self {
        let ideas = Arc::new(ScriptedIdeas::default());
        let geolocation = Arc::new(geolocation);
        let controller = Controller::new(
            Store::new(backend.clone()),
            ideas.clone(),
            geolocation.clone(),
        );
        Self { backend, ideas, geolocation, controller }
    }

    fn stored<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.backend
            .get(key)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }
}

const EMAIL: &str = "sam@example.com";

fn hiking_profile() -> UserProfile {
    UserProfile::new("hiking", [Budget::Low, Budget::Moderate], [Availability::Anytime])
}

fn idea(id: &str, title: &str) -> DateIdea {
    IdeaDraft {
        title: title.to_string(),
        description: "Catch golden hour from a ridge trail.".to_string(),
        budget: Budget::Free,
        time_required: "2-3 hours".to_string(),
        couple_benefit: "Shared effort and a view to talk about.".to_string(),
        category: Category::Outdoor,
        is_local: true,
        location_details: "Twin Peaks".to_string(),
    }
    .into_idea(id.to_string())
}

fn seed_user(backend: &InMemoryStore, email: &str, history: &[DateIdea]) {
    let user = UserIdentity::parse(email).unwrap();
    backend
        .set(&keys::profile(&user), &serde_json::to_string(&hiking_profile()).unwrap())
        .unwrap();
    backend
        .set(&keys::history(&user), &serde_json::to_string(history).unwrap())
        .unwrap();
}

async fn signed_in_with_profile(geolocation: SwitchableGeolocation) -> Fixture {
    let mut fx = Fixture::new(geolocation);
    fx.controller.login(EMAIL).unwrap();
    fx.ideas.push_ok(idea("seed", "Seed Idea"));
    fx.controller.save_profile(hiking_profile()).await.unwrap();
    fx
}

//=========================================================================================
// View Routing & Identity
//=========================================================================================

#[test]
fn routes_between_auth_setup_and_main() {
    let backend = Arc::new(InMemoryStore::new());
    seed_user(&backend, "kim@example.com", &[]);
    let mut fx = Fixture::with_backend(backend, SwitchableGeolocation::denied());

    assert_eq!(fx.controller.view(), View::Auth);
    assert_eq!(fx.controller.login("nope"), Err(ValidationError::InvalidEmail));
    assert_eq!(fx.controller.login(""), Err(ValidationError::MissingEmail));
    assert_eq!(fx.controller.view(), View::Auth);

    fx.controller.login(EMAIL).unwrap();
    assert_eq!(fx.controller.view(), View::ProfileSetup);

    fx.controller.login("kim@example.com").unwrap();
    assert_eq!(fx.controller.view(), View::Main);
    assert_eq!(fx.stored::<String>(keys::CURRENT_USER).as_deref(), Some("kim@example.com"));
}

#[test]
fn resumes_the_persisted_user_on_startup() {
    let backend = Arc::new(InMemoryStore::new());
    let past = [idea("2", "Newest"), idea("1", "Oldest")];
    seed_user(&backend, EMAIL, &past);
    backend.set(keys::CURRENT_USER, &format!("\"{}\"", EMAIL)).unwrap();

    let fx = Fixture::with_backend(backend, SwitchableGeolocation::denied());

    assert_eq!(fx.controller.view(), View::Main);
    assert_eq!(fx.controller.current_user().unwrap().as_str(), EMAIL);
    assert_eq!(fx.controller.current_idea(), Some(&past[0]));
}

#[tokio::test]
async fn switching_users_never_leaks_in_memory_state() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    fx.controller.toggle_favorite("seed");
    assert_eq!(fx.controller.history().len(), 1);

    fx.controller.login("kim@example.com").unwrap();
    assert_eq!(fx.controller.view(), View::ProfileSetup);
    assert!(fx.controller.history().is_empty());
    assert!(fx.controller.favorites().is_empty());
    assert!(fx.controller.current_idea().is_none());

    fx.controller.logout();
    assert_eq!(fx.controller.view(), View::Auth);
    assert!(fx.controller.history().is_empty());
    assert!(fx.controller.profile().is_none());
    assert_eq!(fx.stored::<String>(keys::CURRENT_USER), None);
}

#[tokio::test]
async fn logout_then_login_restores_history_and_favorites() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    fx.ideas.push_ok(idea("second", "Board Game Night"));
    fx.controller.generate_idea().await;
    fx.controller.toggle_favorite("seed");

    let history = fx.controller.history().to_vec();
    let favorites = fx.controller.favorites().to_vec();

    fx.controller.logout();
    fx.controller.login(EMAIL).unwrap();

    assert_eq!(fx.controller.history(), history.as_slice());
    assert_eq!(fx.controller.favorites(), favorites.as_slice());
    assert_eq!(fx.controller.profile(), Some(&hiking_profile()));
    assert_eq!(fx.controller.current_idea(), Some(&history[0]));
}

//=========================================================================================
// Profile & First Idea
//=========================================================================================

#[tokio::test]
async fn saving_a_profile_generates_exactly_one_first_idea() {
    let mut fx = Fixture::new(SwitchableGeolocation::at(37.77, -122.42));
    fx.controller.login(EMAIL).unwrap();
    let sunset = idea("2024-01-01T00:00:00.000Z", "Sunset Hike");
    fx.ideas.push_ok(sunset.clone());

    fx.controller.save_profile(hiking_profile()).await.unwrap();

    assert_eq!(fx.ideas.calls(), 1);
    assert_eq!(fx.controller.view(), View::Main);
    assert_eq!(fx.controller.current_idea(), Some(&sunset));
    assert_eq!(fx.controller.history(), &[sunset.clone()]);
    assert_eq!(fx.controller.phase(), GenerationPhase::Idle);

    let request = fx.ideas.last_request();
    assert_eq!(request.profile, hiking_profile());
    assert_eq!(request.location, LocationCoords::new(37.77, -122.42));
    assert_eq!(request.recent_titles, "");

    // Later settles only sync the card; they never re-trigger generation.
    fx.controller.settle().await;
    assert_eq!(fx.ideas.calls(), 1);
    assert_eq!(fx.controller.current_idea(), Some(&sunset));

    let user = UserIdentity::parse(EMAIL).unwrap();
    assert_eq!(fx.stored::<UserProfile>(&keys::profile(&user)), Some(hiking_profile()));
    assert_eq!(fx.stored::<Vec<DateIdea>>(&keys::history(&user)), Some(vec![sunset]));
}

#[tokio::test]
async fn profile_without_interests_is_rejected_before_any_call() {
    let mut fx = Fixture::new(SwitchableGeolocation::denied());
    fx.controller.login(EMAIL).unwrap();

    let result = fx
        .controller
        .save_profile(UserProfile::new("  ", [Budget::Free], [Availability::Weekends]))
        .await;

    assert_eq!(result, Err(ValidationError::MissingInterests));
    assert_eq!(fx.ideas.calls(), 0);
    assert_eq!(fx.controller.view(), View::ProfileSetup);
}

#[tokio::test]
async fn reset_profile_keeps_history_and_favorites() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    fx.controller.toggle_favorite("seed");

    fx.controller.reset_profile();

    assert_eq!(fx.controller.view(), View::ProfileSetup);
    assert!(fx.controller.current_idea().is_none());
    assert!(fx.controller.error().is_none());
    assert_eq!(fx.controller.history().len(), 1);
    assert_eq!(fx.controller.favorites().len(), 1);
    let user = UserIdentity::parse(EMAIL).unwrap();
    assert_eq!(fx.stored::<UserProfile>(&keys::profile(&user)), None);
}

//=========================================================================================
// Generation
//=========================================================================================

#[tokio::test]
async fn successful_generation_prepends_to_history() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    let next = idea("next", "Pottery Class");
    fx.ideas.push_ok(next.clone());

    let outcome = fx.controller.generate_idea().await;

    assert_eq!(outcome, Some(GenerationOutcome::Generated));
    assert_eq!(fx.controller.current_idea(), Some(&next));
    assert_eq!(fx.controller.history()[0], next);
    assert_eq!(fx.controller.history().len(), 2);
    assert_eq!(fx.ideas.last_request().recent_titles, "Seed Idea");
    assert!(!fx.controller.is_loading());
}

#[tokio::test]
async fn failure_with_history_restores_the_latest_entry() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    let before = fx.controller.history()[0].clone();
    fx.ideas.push_err();

    let outcome = fx.controller.generate_idea().await;

    assert_eq!(outcome, Some(GenerationOutcome::Failed));
    assert_eq!(fx.controller.current_idea(), Some(&before));
    assert_eq!(fx.controller.error(), Some(SessionError::GenerationFailed));
    assert_eq!(fx.controller.main_content(), MainContent::Error(SessionError::GenerationFailed));
    assert_eq!(fx.controller.history().len(), 1);
    assert!(!fx.controller.is_loading());
}

#[tokio::test]
async fn failure_with_empty_history_shows_nothing() {
    let mut fx = Fixture::new(SwitchableGeolocation::denied());
    fx.controller.login(EMAIL).unwrap();
    fx.ideas.push_err();

    fx.controller.save_profile(hiking_profile()).await.unwrap();

    assert!(fx.controller.current_idea().is_none());
    assert!(fx.controller.history().is_empty());
    assert_eq!(fx.controller.error(), Some(SessionError::GenerationFailed));
    assert!(!fx.controller.is_loading());
}

#[tokio::test]
async fn generate_while_loading_is_a_no_op() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    let ticket = fx.controller.begin_generation().unwrap();
    assert!(fx.controller.is_loading());
    assert_eq!(fx.controller.main_content(), MainContent::Loading);

    assert_eq!(fx.controller.generate_idea().await, None);
    assert!(fx.controller.begin_generation().is_none());
    assert_eq!(fx.controller.history().len(), 1);
    assert!(fx.controller.current_idea().is_none());
    assert_eq!(fx.ideas.calls(), 1);

    let outcome = fx.controller.complete_generation(ticket, Ok(idea("late", "Late Idea")));
    assert_eq!(outcome, GenerationOutcome::Generated);
    assert!(!fx.controller.is_loading());
    assert_eq!(fx.controller.history().len(), 2);
}

#[tokio::test]
async fn generate_without_profile_does_nothing() {
    let mut fx = Fixture::new(SwitchableGeolocation::denied());
    assert_eq!(fx.controller.generate_idea().await, None);
    fx.controller.login(EMAIL).unwrap();
    assert_eq!(fx.controller.generate_idea().await, None);
    assert_eq!(fx.ideas.calls(), 0);
}

#[tokio::test]
async fn late_results_after_logout_are_discarded() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    let ticket = fx.controller.begin_generation().unwrap();

    fx.controller.logout();
    let outcome = fx.controller.complete_generation(ticket, Ok(idea("stale", "Stale")));
    assert_eq!(outcome, GenerationOutcome::Discarded);

    fx.controller.login(EMAIL).unwrap();
    assert_eq!(fx.controller.history().len(), 1);
    assert!(!fx.controller.is_loading());
}

#[tokio::test]
async fn late_results_after_reset_are_discarded() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    let ticket = fx.controller.begin_generation().unwrap();

    fx.controller.reset_profile();
    assert!(!fx.controller.is_loading());

    let outcome = fx.controller.complete_generation(ticket, Ok(idea("stale", "Stale")));
    assert_eq!(outcome, GenerationOutcome::Discarded);
    assert_eq!(fx.controller.history().len(), 1);
}

#[tokio::test]
async fn saving_a_profile_mid_generation_supersedes_the_pending_request() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    let ticket = fx.controller.begin_generation().unwrap();
    assert_eq!(fx.ideas.calls(), 1);

    fx.ideas.push_ok(idea("second", "Pottery Class"));
    fx.controller.save_profile(hiking_profile()).await.unwrap();
    assert_eq!(fx.ideas.calls(), 2);
    assert!(!fx.controller.is_loading());

    let outcome = fx.controller.complete_generation(ticket, Ok(idea("first", "Stale")));
    assert_eq!(outcome, GenerationOutcome::Discarded);

    let ids: Vec<&str> = fx.controller.history().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["second", "seed"]);
    assert_eq!(fx.controller.current_idea().unwrap().id, "second");
    assert_eq!(fx.controller.phase(), GenerationPhase::Idle);
}

#[tokio::test]
async fn distance_preference_applies_to_the_next_request() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    assert_eq!(fx.ideas.last_request().distance_preference, DistancePreference::Any);

    fx.controller.set_distance_preference(DistancePreference::DayTrip);
    fx.ideas.push_ok(idea("trip", "Wine Country Drive"));
    fx.controller.generate_idea().await;

    assert_eq!(fx.ideas.last_request().distance_preference, DistancePreference::DayTrip);
}

//=========================================================================================
// Location
//=========================================================================================

#[tokio::test]
async fn denied_location_offers_the_manual_form() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    // The first generation clears the location error; ask again to see it.
    fx.controller.request_location().await;

    let err = fx.controller.error().unwrap();
    assert!(err.to_string().starts_with("Location access"));
    assert!(fx.controller.show_location_form());
    assert!(matches!(fx.controller.main_content(), MainContent::Idea(_)));
}

#[tokio::test]
async fn blank_manual_location_changes_nothing() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    fx.controller.request_location().await;
    fx.controller.set_manual_location("Austin").unwrap();
    fx.controller.request_location().await;

    assert_eq!(fx.controller.set_manual_location("   "), Err(ValidationError::EmptyLocation));
    assert_eq!(fx.controller.set_manual_location(""), Err(ValidationError::EmptyLocation));
    assert_eq!(fx.controller.manual_location_query(), "Austin");
    assert_eq!(fx.controller.error(), Some(SessionError::LocationDenied));
}

#[tokio::test]
async fn manual_location_is_committed_and_sent() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    fx.controller.request_location().await;

    fx.controller.set_manual_location_input("  San Francisco, CA ");
    fx.controller.submit_manual_location().unwrap();

    assert_eq!(fx.controller.manual_location_query(), "San Francisco, CA");
    assert_eq!(fx.controller.manual_location_input(), "");
    assert!(fx.controller.error().is_none());

    fx.ideas.push_ok(idea("sf", "Bay Kayak"));
    fx.controller.generate_idea().await;
    let request = fx.ideas.last_request();
    assert_eq!(request.manual_location, "San Francisco, CA");
    assert_eq!(request.location, None);

    let mut rng = rand::thread_rng();
    let ad = fx.controller.current_ad(&mut rng).unwrap();
    assert_ne!(ad.id, "ad-201");
}

#[tokio::test]
async fn fresh_position_overrides_manual_location() {
    let mut fx = signed_in_with_profile(SwitchableGeolocation::denied()).await;
    fx.controller.set_manual_location("Austin").unwrap();

    fx.geolocation.set(LocationCoords::new(30.27, -97.74));
    fx.controller.request_location().await;

    assert_eq!(fx.controller.manual_location_query(), "");
    assert_eq!(fx.controller.location(), LocationCoords::new(30.27, -97.74));
    assert!(fx.controller.error().is_none());
}

//=========================================================================================
// Favourites & Selection
//=========================================================================================

#[test]
fn favoriting_and_unfavoriting_from_history() {
    let backend = Arc::new(InMemoryStore::new());
    let history = [idea("Z", "Zoo"), idea("X", "Ice Skating"), idea("Y", "Yoga")];
    seed_user(&backend, EMAIL, &history);
    let mut fx = Fixture::with_backend(backend, SwitchableGeolocation::denied());
    fx.controller.login(EMAIL).unwrap();

    assert!(fx.controller.toggle_favorite("X"));
    assert_eq!(fx.controller.favorites(), &[history[1].clone()]);
    assert!(fx.controller.is_favorited("X"));

    assert!(!fx.controller.toggle_favorite("X"));
    assert!(fx.controller.favorites().is_empty());

    let user = UserIdentity::parse(EMAIL).unwrap();
    assert_eq!(fx.stored::<Vec<DateIdea>>(&keys::favorites(&user)), Some(vec![]));
}

#[test]
fn toggling_twice_restores_the_favorite_set() {
    let backend = Arc::new(InMemoryStore::new());
    let history = [idea("A", "A"), idea("B", "B"), idea("C", "C")];
    seed_user(&backend, EMAIL, &history);
    let mut fx = Fixture::with_backend(backend, SwitchableGeolocation::denied());
    fx.controller.login(EMAIL).unwrap();
    fx.controller.toggle_favorite("A");
    fx.controller.toggle_favorite("C");

    let ids = |c: &Controller| {
        let mut ids: Vec<String> = c.favorites().iter().map(|f| f.id.clone()).collect();
        ids.sort();
        ids
    };
    let before = ids(&fx.controller);
    for id in ["A", "B"] {
        fx.controller.toggle_favorite(id);
        fx.controller.toggle_favorite(id);
        assert_eq!(ids(&fx.controller), before);
    }
}

#[test]
fn unknown_ids_cannot_be_favorited() {
    let mut fx = Fixture::new(SwitchableGeolocation::denied());
    fx.controller.login(EMAIL).unwrap();
    assert!(!fx.controller.toggle_favorite("missing"));
    assert!(fx.controller.favorites().is_empty());
}

#[test]
fn selecting_an_idea_from_the_panel_displays_it() {
    let backend = Arc::new(InMemoryStore::new());
    let history = [idea("new", "Newest"), idea("old", "Oldest")];
    seed_user(&backend, EMAIL, &history);
    let mut fx = Fixture::with_backend(backend, SwitchableGeolocation::denied());
    fx.controller.login(EMAIL).unwrap();
    assert_eq!(fx.controller.current_idea(), Some(&history[0]));

    assert!(fx.controller.select_idea("old"));
    fx.controller.sync_displayed_idea();
    assert_eq!(fx.controller.current_idea(), Some(&history[1]));
    assert!(!fx.controller.select_idea("missing"));
}
