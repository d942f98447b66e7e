//! Binary row encoding for pooled temp storage
//!
//! Rows headed for a temp table are flattened into one variable-length
//! payload: a tag byte per value followed by a fixed-width or
//! length-prefixed body. Little-endian throughout.

use emberql_types::SqlValue;

use crate::{Row, StorageError};

const TAG_NULL: u8 = 0;
const TAG_TINYINT: u8 = 1;
const TAG_SMALLINT: u8 = 2;
const TAG_INTEGER: u8 = 3;
const TAG_BIGINT: u8 = 4;
const TAG_DOUBLE: u8 = 5;
const TAG_VARCHAR: u8 = 6;
const TAG_BOOLEAN: u8 = 7;

/// Append the encoding of `row` to `out`.
pub fn encode_row(row: &Row, out: &mut Vec<u8>) {
    for value in &row.values {
        match value {
            SqlValue::Null => out.push(TAG_NULL),
            SqlValue::Tinyint(v) => {
                out.push(TAG_TINYINT);
                out.extend_from_slice(&v.to_le_bytes());
            }
            SqlValue::Smallint(v) => {
                out.push(TAG_SMALLINT);
                out.extend_from_slice(&v.to_le_bytes());
            }
            SqlValue::Integer(v) => {
                out.push(TAG_INTEGER);
                out.extend_from_slice(&v.to_le_bytes());
            }
            SqlValue::Bigint(v) => {
                out.push(TAG_BIGINT);
                out.extend_from_slice(&v.to_le_bytes());
            }
            SqlValue::Double(v) => {
                out.push(TAG_DOUBLE);
                out.extend_from_slice(&v.to_le_bytes());
            }
            SqlValue::Varchar(s) => {
                out.push(TAG_VARCHAR);
                out.extend_from_slice(&(s.len() as u32).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            SqlValue::Boolean(v) => {
                out.push(TAG_BOOLEAN);
                out.push(*v as u8);
            }
        }
    }
}

/// Decode a row of `column_count` values from `bytes`.
pub fn decode_row(bytes: &[u8], column_count: usize) -> Result<Row, StorageError> {
    let mut reader = Reader { bytes, pos: 0 };
    let mut values = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        values.push(reader.read_value()?);
    }
    if reader.pos != bytes.len() {
        return Err(StorageError::CorruptPayload(format!(
            "{} trailing bytes after {} columns",
            bytes.len() - reader.pos,
            column_count
        )));
    }
    Ok(Row::new(values))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn read_value(&mut self) -> Result<SqlValue, StorageError> {
        let tag = self.take(1)?[0];
        match tag {
            TAG_NULL => Ok(SqlValue::Null),
            TAG_TINYINT => Ok(SqlValue::Tinyint(i8::from_le_bytes(
                self.take(1)?.try_into().expect("sized take"),
            ))),
            TAG_SMALLINT => Ok(SqlValue::Smallint(i16::from_le_bytes(
                self.take(2)?.try_into().expect("sized take"),
            ))),
            TAG_INTEGER => Ok(SqlValue::Integer(i64::from_le_bytes(
                self.take(8)?.try_into().expect("sized take"),
            ))),
            TAG_BIGINT => Ok(SqlValue::Bigint(i64::from_le_bytes(
                self.take(8)?.try_into().expect("sized take"),
            ))),
            TAG_DOUBLE => Ok(SqlValue::Double(f64::from_le_bytes(
                self.take(8)?.try_into().expect("sized take"),
            ))),
            TAG_VARCHAR => {
                let len =
                    u32::from_le_bytes(self.take(4)?.try_into().expect("sized take")) as usize;
                let raw = self.take(len)?;
                let s = std::str::from_utf8(raw).map_err(|e| {
                    StorageError::CorruptPayload(format!("invalid UTF-8 in VARCHAR: {}", e))
                })?;
                Ok(SqlValue::Varchar(s.to_string()))
            }
            TAG_BOOLEAN => Ok(SqlValue::Boolean(self.take(1)?[0] != 0)),
            other => Err(StorageError::CorruptPayload(format!("unknown value tag {}", other))),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], StorageError> {
        if self.pos + len > self.bytes.len() {
            return Err(StorageError::CorruptPayload("truncated payload".to_string()));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}
