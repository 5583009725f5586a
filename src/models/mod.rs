//! Request and Response models for the parameter cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_code, BatchQuery, ParamQuery, UpdateParamRequest};
pub use responses::{
    BatchResponse, DeleteResponse, HealthResponse, ParamResponse, StatsResponse, UpdateResponse,
};
