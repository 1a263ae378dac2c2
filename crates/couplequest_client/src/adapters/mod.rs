pub mod file_store;
pub mod geolocation;
pub mod http_idea;

pub use file_store::JsonFileStore;
pub use geolocation::ConfiguredGeolocation;
pub use http_idea::HttpIdeaClient;
