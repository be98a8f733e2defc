//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine sessions and repository calls into use-case APIs.
//! - Keep UI shells decoupled from storage details.

pub mod annotation_service;
