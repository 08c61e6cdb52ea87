pub mod call;
pub mod realtime;
pub mod summary;
