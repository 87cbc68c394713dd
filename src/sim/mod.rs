pub mod bounds;
pub mod event;
pub mod fallback;
pub mod horizontal;
pub mod probe;
pub mod step;
pub mod vertical;
pub mod world;
