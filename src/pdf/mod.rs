pub mod geometry;
pub mod optimizer;
pub mod reader;
pub mod writer;
