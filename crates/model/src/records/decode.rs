use crate::records::row::RowData;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to deserialize row: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to decode row: {0}")]
    Custom(String),
}

/// Turns a decoded row mapping into the caller's record type.
pub trait RowDecoder<T>: Send + Sync {
    fn decode(&self, row: &RowData) -> Result<T, DecodeError>;
}

/// Deserializes the row's JSON object form into `T`.
///
/// Columns with no matching field are ignored; fields with no matching column
/// fall back to whatever `T`'s `Deserialize` impl does for a missing key
/// (`Option` fields become `None`, `#[serde(default)]` fields take defaults).
pub struct SerdeDecoder<T>(PhantomData<fn() -> T>);

impl<T> SerdeDecoder<T> {
    pub fn new() -> Self {
        SerdeDecoder(PhantomData)
    }
}

impl<T> Default for SerdeDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> RowDecoder<T> for SerdeDecoder<T> {
    fn decode(&self, row: &RowData) -> Result<T, DecodeError> {
        Ok(serde_json::from_value(row.to_json())?)
    }
}

/// Hands rows back untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl RowDecoder<RowData> for PassThrough {
    fn decode(&self, row: &RowData) -> Result<RowData, DecodeError> {
        Ok(row.clone())
    }
}

pub struct FnDecoder<F>(F);

impl<T, F> RowDecoder<T> for FnDecoder<F>
where
    F: Fn(&RowData) -> Result<T, DecodeError> + Send + Sync,
{
    fn decode(&self, row: &RowData) -> Result<T, DecodeError> {
        (self.0)(row)
    }
}

/// Wraps a closure as a decoder.
pub fn from_fn<T, F>(f: F) -> FnDecoder<F>
where
    F: Fn(&RowData) -> Result<T, DecodeError> + Send + Sync,
{
    FnDecoder(f)
}
