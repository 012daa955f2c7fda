//! JSON array files
//!
//! ```json
//! {
//!   "schema": {
//!     "name": "temps",
//!     "dimensions": [{"name": "x", "start_min": 0, "end_max": 39, "chunk_interval": 10}],
//!     "attributes": [{"id": 0, "name": "t", "type": "double"}]
//!   },
//!   "cells": [{"pos": [3], "values": [21.5]}]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::array::{ArrayDesc, ArrayError, Coordinates, Value};

use super::builder::MemArrayBuilder;
use super::memory::MemArray;

/// Array file loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid array JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Array(#[from] ArrayError),
}

/// One cell record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub pos: Coordinates,
    pub values: Vec<Value>,
}

/// On-disk layout of an array file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayFile {
    pub schema: ArrayDesc,
    #[serde(default)]
    pub cells: Vec<CellRecord>,
}

impl ArrayFile {
    /// Builds the in-memory array
    pub fn into_array(self) -> Result<MemArray, LoadError> {
        let mut builder = MemArrayBuilder::new(self.schema)?;
        for cell in self.cells {
            builder.insert(cell.pos, cell.values)?;
        }
        Ok(builder.build())
    }
}

/// Parses an array from JSON text
pub fn parse_array(json: &str) -> Result<MemArray, LoadError> {
    let file: ArrayFile = serde_json::from_str(json)?;
    file.into_array()
}

/// Reads an array file
pub fn load_array(path: &Path) -> Result<MemArray, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_array(&content)
}
