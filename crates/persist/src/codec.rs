//! Store file encoding.
//!
//! A file is a single zstd frame holding one CBOR map with one entry: a
//! list name (`"Logs"`, `"Locks"`) mapped to an array of child maps.
//!
//! ```text
//! zstd( { "Logs": [ { "PlayerName": .., "X": .., .. }, .. ] } )
//! ```

use crate::error::StoreError;
use ciborium::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use std::path::Path;

const ZSTD_LEVEL: i32 = 3;

/// Children decoded from a list file, plus how many had to be dropped.
#[derive(Debug)]
pub(crate) struct ListRead<T> {
    pub entries: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for ListRead<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            skipped: 0,
        }
    }
}

/// Replace the file at `path` with `entries` stored under `list_name`.
pub(crate) fn write_list<T: Serialize>(
    path: &Path,
    list_name: &str,
    entries: &[T],
) -> Result<(), StoreError> {
    let list = Value::serialized(entries).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    let root = Value::Map(vec![(Value::Text(list_name.to_string()), list)]);

    let cbor_bytes = cbor_serialize(&root)?;
    let compressed = zstd_compress(&cbor_bytes)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &compressed)?;
    Ok(())
}

/// Read the list named `list_name` from `path`.
///
/// A root without that list reads as empty. Children that are not maps, or
/// whose fields have the wrong type, are skipped so the rest still load.
pub(crate) fn read_list<T: DeserializeOwned>(
    path: &Path,
    list_name: &str,
) -> Result<ListRead<T>, StoreError> {
    let compressed = std::fs::read(path)?;
    let cbor_bytes = zstd_decompress(&compressed)?;
    let root: Value = cbor_deserialize(&cbor_bytes)?;

    let Value::Map(fields) = root else {
        return Err(StoreError::Malformed("root is not a map".into()));
    };
    let Some(list) = fields
        .into_iter()
        .find_map(|(key, value)| (key.as_text() == Some(list_name)).then_some(value))
    else {
        return Ok(ListRead::default());
    };
    let Value::Array(children) = list else {
        return Err(StoreError::Malformed(format!("{list_name} is not a list")));
    };

    let mut read = ListRead::default();
    for (index, child) in children.into_iter().enumerate() {
        if !child.is_map() {
            tracing::warn!(list = list_name, index, "skipping store entry that is not a map");
            read.skipped += 1;
            continue;
        }
        match child.deserialized::<T>() {
            Ok(entry) => read.entries.push(entry),
            Err(e) => {
                tracing::warn!(list = list_name, index, error = %e, "skipping malformed store entry");
                read.skipped += 1;
            }
        }
    }
    Ok(read)
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), ZSTD_LEVEL)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}
