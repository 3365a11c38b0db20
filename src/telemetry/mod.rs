pub mod parser;

pub use parser::FrameParser;
