//! Publisher boundary: run output handed to the external site renderer.
//!
//! The pipeline itself does no templating. Everything the renderer needs —
//! category pages, the merged front page, navigation labels, the feed error
//! report — is serialized into one site-data document by [`json`]; the
//! rendering/templating stage and the HTTP serving of the built site live
//! outside this crate.

pub mod json;
