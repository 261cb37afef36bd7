//! Built-in `BossEncode`/`BossDecode` implementations.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::codec::reader::{value_to_f64, value_to_i64};
use crate::error::BossError;
use crate::types::{StructValue, Value};

use super::{BossDecode, BossEncode, Mapper};

macro_rules! int_impls {
    ($($t:ty),*) => {$(
        impl BossEncode for $t {
            fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
                Ok(Value::Integer(i64::from(*self)))
            }
        }

        impl BossDecode for $t {
            fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
                let i = value_to_i64(value)?;
                <$t>::try_from(i).map_err(|_| {
                    BossError::Format(format!(
                        "integer out of range for {}: {i}",
                        stringify!($t)
                    ))
                })
            }
        }
    )*};
}

int_impls!(i8, i16, i32, i64, u16, u32);

impl BossEncode for u64 {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        Ok(Value::from(*self))
    }
}

impl BossDecode for u64 {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        match value {
            Value::Integer(i) => u64::try_from(*i)
                .map_err(|_| BossError::Format(format!("integer out of range for u64: {i}"))),
            Value::BigInteger(b) => b
                .to_u64()
                .ok_or_else(|| BossError::Format(format!("integer out of range for u64: {b}"))),
            other => Err(BossError::Format(format!("expected integer, got {other}"))),
        }
    }
}

impl BossEncode for bool {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        Ok(Value::Boolean(*self))
    }
}

impl BossDecode for bool {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        value
            .as_bool()
            .ok_or_else(|| BossError::Format(format!("expected boolean, got {value}")))
    }
}

impl BossEncode for f64 {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        Ok(Value::Double(*self))
    }
}

impl BossDecode for f64 {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        value_to_f64(value)
    }
}

impl BossEncode for String {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        Ok(Value::from(self.as_str()))
    }
}

impl BossDecode for String {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| BossError::Format(format!("expected text, got {value}")))
    }
}

/// Byte vectors map to the binary kind, not to lists.
impl BossEncode for Vec<u8> {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        Ok(Value::from(&self[..]))
    }
}

impl BossDecode for Vec<u8> {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| BossError::Format(format!("expected binary, got {value}")))
    }
}

impl BossEncode for BigInt {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        Ok(Value::from(self.clone()))
    }
}

impl BossDecode for BigInt {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        value
            .to_bigint()
            .ok_or_else(|| BossError::Format(format!("expected integer, got {value}")))
    }
}

/// `None` is the BOSS null; a present value encodes as itself. This is what
/// keeps missing-versus-present observable through the mapper boundary.
impl<T: BossEncode + 'static> BossEncode for Option<T> {
    fn encode_boss(&self, mapper: &Mapper) -> Result<Value, BossError> {
        match self {
            Some(value) => mapper.encode(value),
            None => Ok(Value::Null),
        }
    }
}

impl<T: BossDecode + 'static> BossDecode for Option<T> {
    fn decode_boss(value: &Value, mapper: &Mapper) -> Result<Self, BossError> {
        match value {
            Value::Null => Ok(None),
            other => Ok(Some(mapper.decode(other)?)),
        }
    }
}

impl BossEncode for StructValue {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        Ok(Value::from(self.clone()))
    }
}

impl BossDecode for StructValue {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        value
            .as_map()
            .cloned()
            .ok_or_else(|| BossError::Format(format!("expected map, got {value}")))
    }
}

impl BossEncode for Value {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        Ok(self.clone())
    }
}

impl BossDecode for Value {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        Ok(value.clone())
    }
}

/// Platform time maps to the second-resolution timestamp kind.
impl BossEncode for SystemTime {
    fn encode_boss(&self, _: &Mapper) -> Result<Value, BossError> {
        let secs = self
            .duration_since(UNIX_EPOCH)
            .map_err(|_| BossError::Type("time before the Unix epoch".into()))?
            .as_secs();
        let secs = i64::try_from(secs)
            .map_err(|_| BossError::Type("time out of timestamp range".into()))?;
        Ok(Value::Timestamp(secs))
    }
}

impl BossDecode for SystemTime {
    fn decode_boss(value: &Value, _: &Mapper) -> Result<Self, BossError> {
        let secs = value
            .as_timestamp()
            .ok_or_else(|| BossError::Format(format!("expected timestamp, got {value}")))?;
        let secs = u64::try_from(secs)
            .map_err(|_| BossError::Format(format!("timestamp out of range: {secs}")))?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}
