mod delivery_tracker;
mod main_client_context;
mod refresh_handler;

pub use delivery_tracker::*;
pub use main_client_context::*;
pub use refresh_handler::*;
