//! Types shared between the API client and the desktop front end: domain
//! identifiers and the wire shapes of the imaging backend.

pub mod domain;
pub mod error;
pub mod protocol;
