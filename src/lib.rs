pub mod client;
pub mod fetch_error;
pub mod response;
pub mod stations;
