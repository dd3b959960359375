//! Value Type Registry
//!
//! Explicit registration of the value types a cache can persist.
//!
//! Each persistable Rust type is bound to a stable string tag. Snapshots store
//! the tag next to the bincode payload so heterogeneous values can share one
//! stream. Values of unregistered types cannot be saved.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::cache::Value;

type EncodeFn = fn(&(dyn Any + Send + Sync)) -> bincode::Result<Vec<u8>>;
type DecodeFn = fn(&[u8]) -> bincode::Result<Value>;

#[derive(Clone)]
struct Encoder {
    tag: String,
    encode: EncodeFn,
}

// == Value Registry ==
/// Maps Rust value types to snapshot tags and back.
#[derive(Clone, Default)]
pub struct ValueRegistry {
    encoders: HashMap<TypeId, Encoder>,
    decoders: HashMap<String, (TypeId, DecodeFn)>,
}

impl ValueRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with common scalar, string and byte types.
    pub fn with_builtins() -> Self {
        Self::new()
            .with::<String>("string")
            .with::<bool>("bool")
            .with::<i32>("i32")
            .with::<i64>("i64")
            .with::<u32>("u32")
            .with::<u64>("u64")
            .with::<f64>("f64")
            .with::<Vec<u8>>("bytes")
            .with::<Vec<String>>("string_list")
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<T>(mut self, tag: impl Into<String>) -> Self
    where
        T: Serialize + DeserializeOwned + Any + Send + Sync,
    {
        self.register::<T>(tag);
        self
    }

    /// Binds `T` to `tag`.
    ///
    /// Rebinding a tag or a type replaces the previous binding.
    pub fn register<T>(&mut self, tag: impl Into<String>) -> &mut Self
    where
        T: Serialize + DeserializeOwned + Any + Send + Sync,
    {
        let tag = tag.into();
        let type_id = TypeId::of::<T>();

        if let Some((old_type, _)) = self.decoders.get(&tag) {
            if *old_type != type_id {
                warn!(tag = %tag, "Rebinding snapshot tag to {}", std::any::type_name::<T>());
                let old_type = *old_type;
                self.encoders.remove(&old_type);
            }
        }
        if let Some(old) = self.encoders.get(&type_id) {
            if old.tag != tag {
                let old_tag = old.tag.clone();
                self.decoders.remove(&old_tag);
            }
        }

        self.encoders.insert(
            type_id,
            Encoder {
                tag: tag.clone(),
                encode: encode_as::<T>,
            },
        );
        self.decoders.insert(tag, (type_id, decode_as::<T>));
        self
    }

    /// Returns true if values of `T` can be persisted.
    pub fn is_registered<T: Any>(&self) -> bool {
        self.encoders.contains_key(&TypeId::of::<T>())
    }

    /// Returns the tag bound to the value's payload type, if any.
    pub fn tag_of(&self, value: &Value) -> Option<&str> {
        self.encoders
            .get(&value.payload_type_id())
            .map(|encoder| encoder.tag.as_str())
    }

    /// Encodes a value into its tag and payload bytes.
    ///
    /// Returns `Ok(None)` if the value's type is not registered.
    pub(crate) fn encode(&self, value: &Value) -> bincode::Result<Option<(String, Vec<u8>)>> {
        match self.encoders.get(&value.payload_type_id()) {
            Some(encoder) => {
                let payload = (encoder.encode)(value.as_any())?;
                Ok(Some((encoder.tag.clone(), payload)))
            }
            None => Ok(None),
        }
    }

    /// Decodes payload bytes stored under `tag`.
    ///
    /// Returns `Ok(None)` if the tag is unknown.
    pub(crate) fn decode(&self, tag: &str, payload: &[u8]) -> bincode::Result<Option<Value>> {
        match self.decoders.get(tag) {
            Some((_, decode)) => decode(payload).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for ValueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("ValueRegistry").field("tags", &tags).finish()
    }
}

fn encode_as<T: Serialize + Any>(value: &(dyn Any + Send + Sync)) -> bincode::Result<Vec<u8>> {
    let typed = value.downcast_ref::<T>().ok_or_else(|| {
        Box::new(bincode::ErrorKind::Custom(format!(
            "value is not a {}",
            std::any::type_name::<T>()
        )))
    })?;
    bincode::serialize(typed)
}

fn decode_as<T: DeserializeOwned + Any + Send + Sync>(payload: &[u8]) -> bincode::Result<Value> {
    bincode::deserialize::<T>(payload).map(Value::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        hits: u32,
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ValueRegistry::with_builtins();
        assert!(registry.is_registered::<String>());
        assert!(registry.is_registered::<u64>());
        assert!(!registry.is_registered::<Session>());
    }

    #[test]
    fn test_custom_type_encodes_and_decodes() {
        let registry = ValueRegistry::new().with::<Session>("session");
        let value = Value::new(Session {
            user: "ada".to_string(),
            hits: 3,
        });

        let (tag, payload) = registry.encode(&value).unwrap().unwrap();
        assert_eq!(tag, "session");

        let decoded = registry.decode(&tag, &payload).unwrap().unwrap();
        assert_eq!(
            decoded.downcast_ref::<Session>(),
            Some(&Session {
                user: "ada".to_string(),
                hits: 3
            })
        );
    }

    #[test]
    fn test_unregistered_type_is_none() {
        let registry = ValueRegistry::with_builtins();
        let value = Value::new(Session {
            user: "bob".to_string(),
            hits: 1,
        });

        assert!(registry.tag_of(&value).is_none());
        assert!(registry.encode(&value).unwrap().is_none());
    }

    #[test]
    fn test_unknown_tag_is_none() {
        let registry = ValueRegistry::with_builtins();
        assert!(registry.decode("session", &[]).unwrap().is_none());
    }

    #[test]
    fn test_rebinding_tag_drops_old_type() {
        let registry = ValueRegistry::new().with::<u32>("number").with::<u64>("number");

        assert!(!registry.is_registered::<u32>());
        assert!(registry.is_registered::<u64>());
        assert_eq!(registry.tag_of(&Value::new(1u64)), Some("number"));
    }

    #[test]
    fn test_rebinding_type_drops_old_tag() {
        let registry = ValueRegistry::new().with::<u32>("old").with::<u32>("new");

        assert_eq!(registry.tag_of(&Value::new(1u32)), Some("new"));
        assert!(registry.decode("old", &[0, 0, 0, 0]).unwrap().is_none());
    }
}
