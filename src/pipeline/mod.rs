// Edge detection pipeline — grayscale, blur, Canny, recolour.

pub mod detector;
pub mod error;
pub mod filters;
