pub mod history;
pub mod image;
pub mod request;

pub use history::*;
pub use image::*;
pub use request::*;
