pub mod body;
pub mod geometry;
pub mod junction;
pub mod slope;
pub mod terrain;
