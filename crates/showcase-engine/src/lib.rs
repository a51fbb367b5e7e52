mod api;
mod config;
mod dryrun;
mod http;
mod navigation;
mod session;

pub use api::{
    default_api_registry, error_chain_text, GalleryApi, GalleryApiRegistry, ERROR_TEXT_MAX_CHARS,
};
pub use config::{GalleryConfig, API_BASE_ENV, BACKEND_ENV, OVERLAP_ENV};
pub use dryrun::DryrunGalleryApi;
pub use http::HttpGalleryApi;
pub use navigation::{NavigationLog, Navigator};
pub use session::{new_session_id, CreatePostSession, SessionSnapshot};
