pub mod column;
pub mod die;
pub mod grid;
pub mod player;
