pub mod account_reaper;
pub mod document_feed;
pub mod errors;
pub mod notification_dispatcher;
pub mod notification_objects;
pub mod order_commit_api;
pub mod payment_objects;
