pub mod booking;
pub mod document;
