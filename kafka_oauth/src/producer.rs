mod produce_loop;
mod producer_wrapper;
mod sample_records;

pub use produce_loop::*;
pub use producer_wrapper::*;
pub use sample_records::*;
