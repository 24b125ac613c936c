pub mod geometry;
pub mod hand;
pub mod io;
pub mod system;
pub mod tracking;
