pub mod auth;
pub mod comments;
pub mod error;
pub mod middleware;
pub mod playlists;
pub mod posts;
pub mod reactions;
pub mod stats;
pub mod subscriptions;
pub mod videos;

pub(crate) mod convert;
