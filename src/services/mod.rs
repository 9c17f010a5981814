pub mod session_store;
pub mod upload_coordinator;
