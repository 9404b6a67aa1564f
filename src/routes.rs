pub mod index;
pub mod members;
pub mod modal;
pub mod sse;
pub mod upload;
