// Frame marshalling — camera buffer decode and JPEG encode.

pub mod compress;
pub mod convert;
pub mod dummy;
pub mod error;
pub mod types;
