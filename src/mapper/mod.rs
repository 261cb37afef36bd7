//! Object-mapper boundary: typed application records ⇄ BOSS dynamic values.
//!
//! The mapper never inspects runtime metadata. Applications describe their
//! records explicitly — [`BossEncode`]/[`BossDecode`] implementations walk
//! fields by name through [`StructBuilder`] and [`FieldMap`] — and may
//! register per-type converters that take precedence over the built-in
//! dispatch in both directions, keyed by the target type's `TypeId`.

mod convert;
mod fields;

pub use fields::{FieldMap, StructBuilder};

use std::any::{Any, TypeId};
use std::collections::HashMap;

use bytes::Bytes;

use crate::codec;
use crate::error::BossError;
use crate::types::Value;

/// Conversion of a typed value into a BOSS dynamic value.
pub trait BossEncode {
    fn encode_boss(&self, mapper: &Mapper) -> Result<Value, BossError>;
}

/// Conversion of a BOSS dynamic value back into a typed value.
pub trait BossDecode: Sized {
    fn decode_boss(value: &Value, mapper: &Mapper) -> Result<Self, BossError>;
}

type EncodeFn = Box<dyn Fn(&dyn Any) -> Result<Value, BossError> + Send + Sync>;
type DecodeFn = Box<dyn Fn(&Value) -> Result<Box<dyn Any>, BossError> + Send + Sync>;

struct Converter {
    encode: EncodeFn,
    decode: DecodeFn,
}

/// Entry point of the mapping layer.
///
/// A `Mapper` holds the pluggable converter registry; a default instance
/// simply dispatches to the `BossEncode`/`BossDecode` implementations.
#[derive(Default)]
pub struct Mapper {
    converters: HashMap<TypeId, Converter>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a converter for `T`, consulted before the built-in dispatch
    /// whenever `T` is encoded or decoded through this mapper.
    pub fn register<T, E, D>(&mut self, encode: E, decode: D)
    where
        T: 'static,
        E: Fn(&T) -> Result<Value, BossError> + Send + Sync + 'static,
        D: Fn(&Value) -> Result<T, BossError> + Send + Sync + 'static,
    {
        self.converters.insert(
            TypeId::of::<T>(),
            Converter {
                encode: Box::new(move |any| {
                    let Some(typed) = any.downcast_ref::<T>() else {
                        unreachable!("converter invoked with a foreign type");
                    };
                    encode(typed)
                }),
                decode: Box::new(move |value| Ok(Box::new(decode(value)?) as Box<dyn Any>)),
            },
        );
    }

    /// Encodes a typed value, converter first.
    pub fn encode<T: BossEncode + 'static>(&self, value: &T) -> Result<Value, BossError> {
        if let Some(converter) = self.converters.get(&TypeId::of::<T>()) {
            return (converter.encode)(value);
        }
        value.encode_boss(self)
    }

    /// Decodes a typed value, converter first.
    pub fn decode<T: BossDecode + 'static>(&self, value: &Value) -> Result<T, BossError> {
        if let Some(converter) = self.converters.get(&TypeId::of::<T>()) {
            return match (converter.decode)(value)?.downcast::<T>() {
                Ok(boxed) => Ok(*boxed),
                Err(_) => unreachable!("converter registered under the TypeId of T"),
            };
        }
        T::decode_boss(value, self)
    }

    /// Encodes a sequence element-wise into a BOSS list.
    pub fn encode_seq<T: BossEncode + 'static>(&self, items: &[T]) -> Result<Value, BossError> {
        let items = items
            .iter()
            .map(|item| self.encode(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::from(items))
    }

    /// Decodes a BOSS list element-wise.
    pub fn decode_seq<T: BossDecode + 'static>(&self, value: &Value) -> Result<Vec<T>, BossError> {
        let items = value
            .as_list()
            .ok_or_else(|| BossError::Format(format!("expected list, got {value}")))?;
        items.iter().map(|item| self.decode(item)).collect()
    }

    /// Encodes a typed value straight to BOSS bytes.
    pub fn pack<T: BossEncode + 'static>(&self, value: &T) -> Result<Bytes, BossError> {
        codec::pack(&self.encode(value)?)
    }

    /// Decodes a typed value straight from BOSS bytes.
    pub fn unpack<T: BossDecode + 'static>(&self, bytes: &[u8]) -> Result<T, BossError> {
        self.decode(&codec::unpack(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Shape {
        Circle { radius: f64 },
        Rect { width: i64, height: i64 },
    }

    impl BossEncode for Shape {
        fn encode_boss(&self, mapper: &Mapper) -> Result<Value, BossError> {
            match self {
                Shape::Circle { radius } => Ok(StructBuilder::new(mapper)
                    .field("kind", &"circle".to_string())?
                    .field("radius", radius)?
                    .finish()),
                Shape::Rect { width, height } => Ok(StructBuilder::new(mapper)
                    .field("kind", &"rect".to_string())?
                    .field("width", width)?
                    .field("height", height)?
                    .finish()),
            }
        }
    }

    impl BossDecode for Shape {
        fn decode_boss(value: &Value, mapper: &Mapper) -> Result<Self, BossError> {
            let fields = FieldMap::new(mapper, value)?;
            let kind: String = fields.required("kind")?;
            match kind.as_str() {
                "circle" => Ok(Shape::Circle {
                    radius: fields.required("radius")?,
                }),
                "rect" => Ok(Shape::Rect {
                    width: fields.required("width")?,
                    height: fields.required("height")?,
                }),
                other => Err(BossError::Format(format!("unknown shape kind: {other}"))),
            }
        }
    }

    #[test]
    fn tagged_union_round_trip() {
        let mapper = Mapper::new();
        let shapes = vec![
            Shape::Circle { radius: 2.5 },
            Shape::Rect {
                width: 3,
                height: 4,
            },
            Shape::Circle { radius: 1.0 },
        ];
        let bytes = codec::pack(&mapper.encode_seq(&shapes).unwrap()).unwrap();
        let decoded: Vec<Shape> = mapper.decode_seq(&codec::unpack(&bytes).unwrap()).unwrap();
        assert_eq!(decoded, shapes);
    }

    #[test]
    fn pack_unpack_object() {
        let mapper = Mapper::new();
        let shape = Shape::Rect {
            width: 10,
            height: 20,
        };
        let bytes = mapper.pack(&shape).unwrap();
        assert_eq!(mapper.unpack::<Shape>(&bytes).unwrap(), shape);
    }

    #[test]
    fn converter_overrides_builtin_dispatch() {
        let mut mapper = Mapper::new();
        // Route i64 through text instead of the integer encoding.
        mapper.register::<i64, _, _>(
            |i| Ok(Value::from(i.to_string())),
            |value| {
                let s = value
                    .as_str()
                    .ok_or_else(|| BossError::Format(format!("expected text, got {value}")))?;
                s.parse()
                    .map_err(|e| BossError::Format(format!("bad number: {e}")))
            },
        );

        let encoded = mapper.encode(&42i64).unwrap();
        assert_eq!(encoded, Value::from("42"));
        assert_eq!(mapper.decode::<i64>(&encoded).unwrap(), 42);

        // Other types keep the built-in path.
        assert_eq!(mapper.encode(&7i32).unwrap(), Value::Integer(7));
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let mapper = Mapper::new();
        let value = StructBuilder::new(&mapper)
            .field("kind", &"blob".to_string())
            .unwrap()
            .finish();
        assert!(matches!(
            mapper.decode::<Shape>(&value),
            Err(BossError::Format(_))
        ));
    }
}
