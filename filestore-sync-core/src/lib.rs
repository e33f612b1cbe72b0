#![doc = "filestore-sync-core: reconciliation engine for filestore-sync."]

//! Pushes a selected local file set into a remote filestore container so the
//! remote tree ends up matching it. Local state is authoritative.
//!
//! The engine never talks HTTP directly; it goes through
//! [`contract::Transport`]. The CLI crate provides the network implementation.
//!
//! # Usage
//! Build a [`filestore::FileStore`] over a transport, pick the files with
//! [`selection::select`] and hand both to [`synchronise::synchronise`].

pub mod artifact;
pub mod atom;
pub mod config;
pub mod contract;
pub mod diff;
pub mod error;
pub mod executor;
pub mod filestore;
pub mod index;
pub mod local;
pub mod order;
pub mod path;
pub mod provision;
pub mod remote;
pub mod selection;
pub mod session;
pub mod synchronise;

pub use error::{Result, SyncError};
