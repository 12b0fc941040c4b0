mod code;
mod render;
mod segments;
mod table;

pub use render::{markdown_lines, render_message};
pub use segments::{split_reasoning, Segment};
