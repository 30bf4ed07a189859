use serde::Serialize;
use thiserror::Error;

use crate::config::SerializerType;

/// Error types for serialization operations
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Binary serialization error: {0}")]
    BinaryError(#[from] bincode::Error),
}

/// Base serializer trait without generics for object-safety
pub trait Serializer: Send + Sync {
    fn serialize_to_bytes(&self, data: &dyn SerializeObject) -> Result<Vec<u8>, SerializationError>;
}

/// Trait for objects that can be serialized
pub trait SerializeObject {
    fn to_json(&self) -> Result<Vec<u8>, SerializationError>;
    fn to_binary(&self) -> Result<Vec<u8>, SerializationError>;
}

impl<T: Serialize + ?Sized> SerializeObject for T {
    fn to_json(&self) -> Result<Vec<u8>, SerializationError> {
        serde_json::to_vec(self).map_err(SerializationError::JsonError)
    }

    fn to_binary(&self) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(self).map_err(SerializationError::BinaryError)
    }
}

/// JSON serializer implementation
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize_to_bytes(&self, data: &dyn SerializeObject) -> Result<Vec<u8>, SerializationError> {
        data.to_json()
    }
}

/// Binary serializer implementation using bincode
pub struct BinarySerializer;

impl Serializer for BinarySerializer {
    fn serialize_to_bytes(&self, data: &dyn SerializeObject) -> Result<Vec<u8>, SerializationError> {
        data.to_binary()
    }
}

/// Builds the serializer named in the transport config.
pub fn serializer_for(kind: SerializerType) -> Box<dyn Serializer> {
    match kind {
        SerializerType::Json => Box::new(JsonSerializer),
        SerializerType::Binary => Box::new(BinarySerializer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::bee::{BeeState, NectarDelivered};

    #[test]
    fn json_output_is_readable() {
        let bytes = JsonSerializer
            .serialize_to_bytes(&NectarDelivered { bee: 3 })
            .unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"bee":3}"#);
    }

    #[test]
    fn binary_matches_bincode() {
        let bytes = serializer_for(SerializerType::Binary)
            .serialize_to_bytes(&BeeState::Collecting)
            .unwrap();
        assert_eq!(bytes, bincode::serialize(&BeeState::Collecting).unwrap());
    }
}
