pub mod port;
pub mod reader;

pub use port::wait_for_port;
pub use reader::spawn_reader;
