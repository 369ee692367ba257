use crate::storage::error::{StorageError, StorageResult};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::Read;

/// Maximum number of bytes in a string field. Strings are stored as a
/// 4-byte length prefix followed by exactly this many bytes, zero-padded.
pub const STRING_LEN: usize = 128;

/// Data types supported by the engine. All fields are fixed-width so that
/// a page's slot count can be derived from the schema alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Varchar,
}

impl DataType {
    /// Serialized width of a field of this type, in bytes.
    pub fn width(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Varchar => 4 + STRING_LEN,
        }
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i32),
    Varchar(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Varchar(_) => DataType::Varchar,
        }
    }

    /// Appends this value's fixed-width encoding to `out`.
    ///
    /// Integers are big-endian; strings are a big-endian length followed by
    /// the bytes, zero-padded to [`STRING_LEN`].
    pub fn serialize_into(&self, out: &mut Vec<u8>) -> StorageResult<()> {
        match self {
            Value::Int(v) => out.write_i32::<BigEndian>(*v)?,
            Value::Varchar(s) => {
                let bytes = s.as_bytes();
                if bytes.len() > STRING_LEN {
                    return Err(StorageError::SchemaMismatch(format!(
                        "string of {} bytes exceeds the {} byte field width",
                        bytes.len(),
                        STRING_LEN
                    )));
                }
                out.write_u32::<BigEndian>(bytes.len() as u32)?;
                out.extend_from_slice(bytes);
                out.extend(std::iter::repeat(0u8).take(STRING_LEN - bytes.len()));
            }
        }
        Ok(())
    }

    /// Reads one value of `dtype` from `reader`.
    pub fn deserialize_from<R: Read>(dtype: DataType, reader: &mut R) -> StorageResult<Value> {
        match dtype {
            DataType::Int => Ok(Value::Int(reader.read_i32::<BigEndian>()?)),
            DataType::Varchar => {
                let len = reader.read_u32::<BigEndian>()? as usize;
                let mut buf = vec![0u8; STRING_LEN];
                reader.read_exact(&mut buf)?;
                if len > STRING_LEN {
                    return Err(StorageError::SchemaMismatch(format!(
                        "stored string length {} exceeds field width {}",
                        len, STRING_LEN
                    )));
                }
                buf.truncate(len);
                let s = String::from_utf8(buf).map_err(|e| {
                    StorageError::SchemaMismatch(format!("invalid utf-8 in string field: {}", e))
                })?;
                Ok(Value::Varchar(s))
            }
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Varchar(s) => write!(f, "{}", s),
        }
    }
}
