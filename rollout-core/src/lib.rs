//! Rollout Core
//!
//! Core types and abstractions for the Rollout deployment engine.
//!
//! This crate contains:
//! - Domain types: images, deployments, pipelines, plans, events
//! - DTOs: inputs of the dispatcher procedures
//! - Dispatch: the location-transparent call layer and its procedure catalogue

pub mod dispatch;
pub mod domain;
pub mod dto;
pub mod procedures;

pub use dispatch::{
    DispatchError, Dispatcher, Layer, LayeredDispatcher, LocalDispatcher, Procedure,
};
