//! Request handlers.

pub mod write_model;

pub use write_model::{
    WriteAuthorizationModelRequest, WriteAuthorizationModelResponse, WriteModelHandler,
};
