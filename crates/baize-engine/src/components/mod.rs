pub mod ball;
pub mod cue;
pub mod table;
