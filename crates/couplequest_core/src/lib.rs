pub mod ads;
pub mod controller;
pub mod domain;
pub mod ports;
pub mod prompt;
pub mod session;
pub mod store;

pub use controller::{Controller, GenerationOutcome, GenerationTicket, MainContent, View};
pub use domain::{
    Ad, Availability, Budget, Category, DateIdea, DistancePreference, IdeaDraft, IdeaRequest,
    LocationCoords, UserIdentity, UserProfile, ValidationError,
};
pub use ports::{
    EmailLogOutcome, EmailLogService, GeolocationService, IdeaGenerationService, KeyValueStore,
    PortError, PortResult,
};
pub use session::{GenerationPhase, SessionError};
pub use store::{InMemoryStore, Store};
