//! Provider traits. Each lives in its own module and is named `Provider`,
//! so call sites read `call_platform::Provider`, `summarizer::Provider`, etc.

pub mod call_platform;
pub mod realtime;
pub mod summarizer;
