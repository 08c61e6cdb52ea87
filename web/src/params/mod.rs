//! This module holds typed parameters for various endpoint inputs.
//!
//! The purpose of this module is to define and manage the parameters that are used as inputs
//! for different endpoints in the web application. By using typed parameters, we can ensure
//! that the inputs are validated (by type) and correctly formatted before they are processed by the
//! application logic.
//!
//! Update parameters convert into an `UpdateMap` where an omitted field means "leave unchanged".

pub(crate) mod agent;
pub(crate) mod meeting;
