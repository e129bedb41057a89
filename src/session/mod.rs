// Session lifecycle — the single processor instance and its boundary calls.

pub mod error;
pub mod lifecycle;
