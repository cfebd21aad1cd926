//! Data Transfer Objects for the HTTP API.
//!
//! Response bodies serialize [`crate::models::User`] directly.

use std::collections::HashMap;

/// Body of `POST /user/`: a flat JSON object of string values.
///
/// Only the `name` key is read; other keys are ignored.
pub type SaveUserBody = HashMap<String, String>;
