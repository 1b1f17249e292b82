mod consume_loop;
mod consumer_wrapper;
mod message;

pub use consume_loop::*;
pub use consumer_wrapper::*;
pub use message::*;
