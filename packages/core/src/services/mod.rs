pub mod gotify;

#[cfg(test)]
pub mod mock_gotify;

pub use gotify::{GotifyClient, GotifyResponse, NotificationBackend, RemoteNotification};
