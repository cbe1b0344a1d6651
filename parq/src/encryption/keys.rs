//! External key material: the retriever interface the reader side presents,
//! an explicit KMS-client registry keyed by short identifiers, and the
//! envelope `KeyMaterial` JSON that travels in `key_metadata`.

use std::collections::HashMap;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use parq_core::errors::{CryptoError, Error, Result};
use serde::{Deserialize, Serialize};

/// Maps a `key_metadata` blob back to the key bytes it names.
pub trait KeyRetriever: Send + Sync {
    fn retrieve_key(&self, key_metadata: &[u8]) -> Result<Vec<u8>>;
}

/// Static metadata-to-key table; the simplest retriever, also used in tests.
#[derive(Default)]
pub struct InMemoryKeyRetriever {
    keys: HashMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKeyRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key_metadata: impl Into<Vec<u8>>, key: impl Into<Vec<u8>>) {
        self.keys.insert(key_metadata.into(), key.into());
    }
}

impl KeyRetriever for InMemoryKeyRetriever {
    fn retrieve_key(&self, key_metadata: &[u8]) -> Result<Vec<u8>> {
        self.keys.get(key_metadata).cloned().ok_or_else(|| {
            Error::Encryption(CryptoError::KeyUnavailable(format!(
                "no key for metadata {:?}",
                String::from_utf8_lossy(key_metadata)
            )))
        })
    }
}

/// A master-key service that can wrap and unwrap data keys.
pub trait KmsClient: Send + Sync {
    fn wrap_key(&self, data_key: &[u8], master_key_id: &str) -> Result<String>;
    fn unwrap_key(&self, wrapped: &str, master_key_id: &str) -> Result<Vec<u8>>;
}

pub trait KmsClientFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn KmsClient>>;
}

/// Explicit factory registry keyed by a short identifier; immutable once
/// constructed.
pub struct KmsClientRegistry {
    factories: HashMap<String, Box<dyn KmsClientFactory>>,
}

impl KmsClientRegistry {
    pub fn new(factories: Vec<(String, Box<dyn KmsClientFactory>)>) -> Self {
        Self {
            factories: factories.into_iter().collect(),
        }
    }

    pub fn create(&self, kms_id: &str) -> Result<Arc<dyn KmsClient>> {
        match self.factories.get(kms_id) {
            Some(factory) => factory.create(),
            None => Err(Error::Encryption(CryptoError::KeyUnavailable(format!(
                "no KMS client registered as {:?}",
                kms_id
            )))),
        }
    }
}

/// Envelope key material: which master key wrapped the data key, and the
/// wrapped bytes themselves. Serialized as a small JSON object, stored
/// inline in `key_metadata` or referenced by name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyMaterial {
    #[serde(rename = "keyMaterialType")]
    pub material_type: String,
    #[serde(rename = "internalStorage")]
    pub internal_storage: bool,
    #[serde(rename = "keyReference", skip_serializing_if = "Option::is_none")]
    pub key_reference: Option<String>,
    #[serde(rename = "kmsInstanceID", skip_serializing_if = "Option::is_none")]
    pub kms_instance_id: Option<String>,
    #[serde(rename = "masterKeyID")]
    pub master_key_id: String,
    #[serde(rename = "wrappedDEK")]
    pub wrapped_dek: String,
}

pub const KEY_MATERIAL_TYPE: &str = "PKMT1";

impl KeyMaterial {
    pub fn wrap(
        kms: &dyn KmsClient,
        kms_instance_id: Option<&str>,
        master_key_id: &str,
        data_key: &[u8],
    ) -> Result<Self> {
        Ok(Self {
            material_type: KEY_MATERIAL_TYPE.to_string(),
            internal_storage: true,
            key_reference: None,
            kms_instance_id: kms_instance_id.map(str::to_string),
            master_key_id: master_key_id.to_string(),
            wrapped_dek: kms.wrap_key(data_key, master_key_id)?,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            Error::Encryption(CryptoError::KeyUnavailable(format!(
                "cannot serialize key material: {}",
                e
            )))
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            Error::Encryption(CryptoError::KeyUnavailable(format!(
                "malformed key material: {}",
                e
            )))
        })
    }
}

/// Retriever that unwraps envelope key material through the KMS registry.
/// Key references stored out of line are not resolvable here.
pub struct EnvelopeKeyRetriever {
    registry: Arc<KmsClientRegistry>,
}

impl EnvelopeKeyRetriever {
    pub fn new(registry: Arc<KmsClientRegistry>) -> Self {
        Self { registry }
    }
}

impl KeyRetriever for EnvelopeKeyRetriever {
    fn retrieve_key(&self, key_metadata: &[u8]) -> Result<Vec<u8>> {
        let material = KeyMaterial::from_bytes(key_metadata)?;
        if !material.internal_storage {
            let reference = material.key_reference.as_deref().unwrap_or("<missing>");
            return Err(Error::Encryption(CryptoError::KeyUnavailable(format!(
                "key material stored by reference {:?}; resolve it out of band",
                reference
            ))));
        }
        let kms_id = material
            .kms_instance_id
            .as_deref()
            .unwrap_or(material.master_key_id.as_str());
        let kms = self.registry.create(kms_id)?;
        kms.unwrap_key(&material.wrapped_dek, &material.master_key_id)
    }
}

/// Base64 helpers shared by KMS client implementations.
pub fn encode_key(key: &[u8]) -> String {
    BASE64.encode(key)
}

pub fn decode_key(encoded: &str) -> Result<Vec<u8>> {
    BASE64.decode(encoded).map_err(|e| {
        Error::Encryption(CryptoError::KeyUnavailable(format!(
            "wrapped key is not valid base64: {}",
            e
        )))
    })
}
