#![doc = "docugen-core: core logic library for docugen."]

//! This crate holds the client-side logic for the documentation-generation
//! backend: the backend contract, repository URL validation, the task poller
//! and the transformation of results into view models.
//! Transport and user interface live in the `docugen` crate.
//!
//! # Usage
//! Implement [`contract::DocgenApi`] for a transport, hand it to a
//! [`polling::Poller`], and apply the finished [`polling::AnalysisOutcome`]
//! to a [`workspace::Workspace`].

pub mod contract;
pub mod error;
pub mod models;
pub mod polling;
pub mod transform;
pub mod validator;
pub mod workspace;

pub use error::{ApiError, ExportError, PollError, ValidationError};
