//! Clients for the two Firebase services the canteen server talks to: Cloud Messaging (push notifications) and the
//! Identity Toolkit admin API (deleting authentication accounts).
mod api;
mod config;
mod data_objects;
mod error;
mod fcm;
mod identity;

pub use api::FirebaseApi;
pub use config::FirebaseConfig;
pub use data_objects::{FcmMessage, FcmNotification, FirebaseErrorBody, FirebaseErrorDetail};
pub use error::FirebaseApiError;
pub use fcm::FcmClient;
pub use identity::IdentityAdminClient;
