//! Serialization support for cardiosim types.
//!
//! With the `serde` feature enabled, parameters, indicators, samples,
//! configuration, snapshots and the whole [`PhysiologyModel`] implement
//! `Serialize` and `Deserialize`.
//!
//! Two encodings are offered: bincode for compact engine checkpoints and
//! JSON for configuration files and snapshots a UI can read.
//!
//! # Example
//!
//! ```rust
//! use cardiosim::config::SimulationConfig;
//! use cardiosim::model::PhysiologyModel;
//! use cardiosim::serialization::{Serializable, SerializableFormat};
//! use cardiosim::utils::Random;
//!
//! let mut model =
//!     PhysiologyModel::with_random(SimulationConfig::default(), Random::new(5), 0.0).unwrap();
//! model.tick(10.0).unwrap();
//!
//! let bytes = model.to_bytes(SerializableFormat::Binary).unwrap();
//! let restored: PhysiologyModel =
//!     PhysiologyModel::from_bytes(&bytes, SerializableFormat::Binary).unwrap();
//! assert_eq!(restored.snapshot(), model.snapshot());
//!
//! let json = model.snapshot().to_json().unwrap();
//! assert!(json.contains("indicators"));
//! ```
//!
//! [`PhysiologyModel`]: crate::model::PhysiologyModel

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CardioError, Result};

/// On-disk and on-wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializableFormat {
    /// bincode; compact, used for full engine state.
    #[default]
    Binary,
    /// Pretty-printed JSON; used for configuration and snapshots.
    Json,
}

impl SerializableFormat {
    /// Picks JSON for `.json` files and binary for anything else.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::Json
        } else {
            Self::Binary
        }
    }

    /// Upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Json => "JSON",
        }
    }

    fn encode_failed(self, err: impl fmt::Display) -> CardioError {
        CardioError::SerializationError {
            message: format!("{self} encoding failed: {err}"),
        }
    }

    fn decode_failed(self, err: impl fmt::Display) -> CardioError {
        CardioError::SerializationError {
            message: format!("{self} decoding failed: {err}"),
        }
    }
}

impl fmt::Display for SerializableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializableFormat {
    type Err = CardioError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("binary") || s.eq_ignore_ascii_case("bin") {
            Ok(Self::Binary)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(CardioError::InvalidParameter {
                name: "format",
                message: format!("Unknown format '{s}', expected binary or json"),
            })
        }
    }
}

/// Encoding and decoding for every serde type in the crate.
///
/// Writers and readers are the primitive; bytes, strings and files are thin
/// wrappers over them.
pub trait Serializable: Serialize + DeserializeOwned + Sized {
    /// Encodes into `writer`.
    fn save<W: Write>(&self, writer: W, format: SerializableFormat) -> Result<()> {
        let mut writer = BufWriter::new(writer);
        match format {
            SerializableFormat::Binary => bincode::serialize_into(&mut writer, self)
                .map_err(|e| format.encode_failed(e))?,
            SerializableFormat::Json => serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| format.encode_failed(e))?,
        }
        writer.flush().map_err(|e| CardioError::IoError {
            message: format!("Flush failed: {e}"),
        })
    }

    /// Decodes from `reader`.
    fn load<R: Read>(reader: R, format: SerializableFormat) -> Result<Self> {
        let reader = BufReader::new(reader);
        match format {
            SerializableFormat::Binary => {
                bincode::deserialize_from(reader).map_err(|e| format.decode_failed(e))
            }
            SerializableFormat::Json => {
                serde_json::from_reader(reader).map_err(|e| format.decode_failed(e))
            }
        }
    }

    /// Encodes into a fresh buffer.
    fn to_bytes(&self, format: SerializableFormat) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.save(&mut bytes, format)?;
        Ok(bytes)
    }

    /// Decodes from a byte slice.
    fn from_bytes(bytes: &[u8], format: SerializableFormat) -> Result<Self> {
        Self::load(bytes, format)
    }

    /// Pretty-printed JSON.
    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SerializableFormat::Json.encode_failed(e))
    }

    /// Parses JSON. Missing fields fall back to defaults where the type
    /// allows it.
    fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SerializableFormat::Json.decode_failed(e))
    }

    /// Writes to `path`, creating or truncating it.
    fn save_to_file<P: AsRef<Path>>(&self, path: P, format: SerializableFormat) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| CardioError::IoError {
            message: format!("Cannot create {}: {e}", path.display()),
        })?;
        self.save(file, format)
    }

    /// Reads from `path`.
    fn load_from_file<P: AsRef<Path>>(path: P, format: SerializableFormat) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CardioError::IoError {
            message: format!("Cannot open {}: {e}", path.display()),
        })?;
        Self::load(file, format)
    }

    /// [`save_to_file`](Self::save_to_file) with the format taken from the
    /// extension.
    fn save_to_file_auto<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let format = SerializableFormat::from_path(path.as_ref());
        self.save_to_file(path, format)
    }

    /// [`load_from_file`](Self::load_from_file) with the format taken from
    /// the extension.
    fn load_from_file_auto<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = SerializableFormat::from_path(path.as_ref());
        Self::load_from_file(path, format)
    }
}

impl<T: Serialize + DeserializeOwned> Serializable for T {}
