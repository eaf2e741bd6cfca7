pub mod api_types;
pub mod client;
pub mod mock;
pub mod policy_buddy;
pub mod remote;
pub mod router;
pub mod types;
