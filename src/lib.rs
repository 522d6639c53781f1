//! Enhancement Recommender - point-of-sale data to personalized recommendations
//!
//! A Rust library that turns a spa point-of-sale export into the interaction,
//! user and item datasets of a managed recommendation service, drives the
//! service's training workflow and serves ranked enhancement suggestions.
//!
//! # Features
//!
//! - Reshape raw invoice lines into massage/enhancement pairs
//! - Build and write the three recommendation datasets
//! - Create the bucket and import role when missing, upload the datasets
//! - Idempotent setup of dataset group, datasets, solution and campaign
//! - Contextual recommendation lookup

/// Configuration management
pub mod config;
/// AWS SDK configuration loading
pub mod connection;
/// Raw extract reading and reshaping
pub mod data_loader;
/// Interaction, user and item tables
pub mod dataset_builder;
/// Library error type
pub mod error;
/// CSV output of the datasets
pub mod file_writer;
/// Import role lookup and provisioning
pub mod identity;
/// Recommendation lookup
pub mod inference;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Remote training workflow
pub mod personalize;
/// End-to-end pipeline
pub mod pipeline;
/// Object storage access
pub mod storage;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use config::AppConfig;
pub use error::{RecommenderError, Result};
pub use inference::{Inference, RecommendationRequest};
pub use models::{DatasetKind, Datasets, ImportMode, Recommendation};
pub use personalize::Personalization;
pub use pipeline::TrainPipeline;
