//! Field-by-field mapping between records and BOSS maps.

use crate::error::BossError;
use crate::types::{StructValue, Value};

use super::{BossDecode, BossEncode, Mapper};

/// Encode-side field walker: named fields appended in call order, producing
/// a BOSS map value.
pub struct StructBuilder<'m> {
    mapper: &'m Mapper,
    map: StructValue,
}

impl<'m> StructBuilder<'m> {
    pub fn new(mapper: &'m Mapper) -> Self {
        Self {
            mapper,
            map: StructValue::new(),
        }
    }

    /// Encodes one named field through the mapper (converters apply).
    pub fn field<T: BossEncode + 'static>(
        mut self,
        name: &str,
        value: &T,
    ) -> Result<Self, BossError> {
        let encoded = self.mapper.encode(value)?;
        self.map.insert(name, encoded);
        Ok(self)
    }

    pub fn finish(self) -> Value {
        Value::from(self.map)
    }
}

/// Decode-side field walker over a BOSS map.
pub struct FieldMap<'a> {
    mapper: &'a Mapper,
    map: &'a StructValue,
}

impl<'a> FieldMap<'a> {
    /// Wraps a decoded value that must be a map.
    pub fn new(mapper: &'a Mapper, value: &'a Value) -> Result<Self, BossError> {
        match value {
            Value::Map(map) => Ok(Self {
                mapper,
                map: map.as_ref(),
            }),
            other => Err(BossError::Format(format!("expected a map, got {other}"))),
        }
    }

    pub fn from_struct(mapper: &'a Mapper, map: &'a StructValue) -> Self {
        Self { mapper, map }
    }

    /// Decodes a field that must be present and non-null.
    pub fn required<T: BossDecode + 'static>(&self, name: &str) -> Result<T, BossError> {
        match self.map.get_str(name) {
            None | Some(Value::Null) => {
                Err(BossError::Format(format!("missing required field: {name}")))
            }
            Some(value) => self.mapper.decode(value),
        }
    }

    /// Decodes a field that may be absent; a missing field and an explicit
    /// null both come back as `None`.
    pub fn optional<T: BossDecode + 'static>(&self, name: &str) -> Result<Option<T>, BossError> {
        match self.map.get_str(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(self.mapper.decode(value)?)),
        }
    }

    /// True when the field is present, even as an explicit null.
    pub fn contains(&self, name: &str) -> bool {
        self.map.get_str(name).is_some()
    }
}
