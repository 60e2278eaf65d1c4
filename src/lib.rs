pub mod config;
pub mod controls;
pub mod error;
pub mod events;
pub mod grid;
pub mod pattern;
pub mod surface;
pub mod tasks {
    pub mod slideshow;
}

pub use error::Error;
