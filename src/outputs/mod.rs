//! Output writers for the persistence collaborator.
//!
//! The core owns no file format; these writers serialize the enriched record
//! list (whose serde field names are the schema contract) and the assembled
//! narration text.

pub mod json;
