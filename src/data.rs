pub mod id_locks;
pub mod store;
pub mod student;
