//! Encrypted keystore persisted as a single sealed JSON file.
//!
//! Layout inside the keystore directory:
//!
//! - `master.key`: 32 random bytes, created on first open (mode 0600 on unix)
//! - `keystore.json`: `{ version, nonce, ciphertext }`, base64 fields
//!
//! The plaintext is a JSON object of entry name to value. The cipher key is
//! derived from the master key with HKDF-SHA256, and every write reseals the
//! whole map under a fresh nonce before atomically replacing the file.

use crate::{SecureStorage, StorageError, StorageResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

const MASTER_KEY_FILE: &str = "master.key";
const SEALED_FILE: &str = "keystore.json";
const FORMAT_VERSION: u32 = 1;
const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const HKDF_SALT: &[u8] = b"parity-gateway-keystore";
const HKDF_INFO: &[u8] = b"keystore-seal-v1";

#[derive(Serialize, Deserialize)]
struct SealedFile {
    version: u32,
    nonce: String,
    ciphertext: String,
}

/// [`SecureStorage`] backed by an encrypted file under the gateway base dir.
pub struct FileKeystore {
    dir: PathBuf,
    cipher_key: [u8; KEY_SIZE],
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKeystore {
    /// Open the keystore in `dir`, creating the directory and master key if needed.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(dir)?;

        let master_key = load_or_create_master_key(&dir.join(MASTER_KEY_FILE))?;
        let cipher_key = derive_cipher_key(&master_key)?;

        let sealed_path = dir.join(SEALED_FILE);
        let entries = if sealed_path.exists() {
            unseal(&cipher_key, &std::fs::read(&sealed_path)?)?
        } else {
            BTreeMap::new()
        };

        debug!(dir = %dir.display(), entries = entries.len(), "Keystore opened");

        Ok(Self {
            dir: dir.to_path_buf(),
            cipher_key,
            entries: Mutex::new(entries),
        })
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Platform("keystore lock poisoned".to_string()))?;
        f(&mut entries)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let sealed = seal(&self.cipher_key, entries)?;
        write_atomically(&self.dir.join(SEALED_FILE), &sealed)
    }
}

impl SecureStorage for FileKeystore {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
            self.persist(entries)
        })
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.with_entries(|entries| Ok(entries.get(key).cloned()))
    }
}

fn load_or_create_master_key(path: &Path) -> StorageResult<[u8; KEY_SIZE]> {
    if path.exists() {
        let bytes = std::fs::read(path)?;
        return bytes.as_slice().try_into().map_err(|_| {
            StorageError::Corrupted(format!(
                "master key has {} bytes, expected {}",
                bytes.len(),
                KEY_SIZE
            ))
        });
    }

    let mut key = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut key);
    write_atomically(path, &key)?;
    info!(path = %path.display(), "Generated new keystore master key");
    Ok(key)
}

fn derive_cipher_key(master_key: &[u8]) -> StorageResult<[u8; KEY_SIZE]> {
    let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), master_key);
    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(HKDF_INFO, &mut key)
        .map_err(|e| StorageError::Platform(format!("key derivation failed: {e}")))?;
    Ok(key)
}

fn seal(cipher_key: &[u8; KEY_SIZE], entries: &BTreeMap<String, String>) -> StorageResult<Vec<u8>> {
    let plaintext =
        serde_json::to_vec(entries).map_err(|e| StorageError::Encoding(e.to_string()))?;

    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);

    let cipher = ChaCha20Poly1305::new_from_slice(cipher_key)
        .map_err(|e| StorageError::Platform(e.to_string()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| StorageError::Platform("keystore encryption failed".to_string()))?;

    serde_json::to_vec_pretty(&SealedFile {
        version: FORMAT_VERSION,
        nonce: BASE64.encode(nonce),
        ciphertext: BASE64.encode(ciphertext),
    })
    .map_err(|e| StorageError::Encoding(e.to_string()))
}

fn unseal(cipher_key: &[u8; KEY_SIZE], raw: &[u8]) -> StorageResult<BTreeMap<String, String>> {
    let sealed: SealedFile = serde_json::from_slice(raw)
        .map_err(|e| StorageError::Corrupted(format!("unreadable keystore file: {e}")))?;

    if sealed.version != FORMAT_VERSION {
        return Err(StorageError::Corrupted(format!(
            "unsupported keystore version {}",
            sealed.version
        )));
    }

    let nonce = BASE64
        .decode(&sealed.nonce)
        .map_err(|e| StorageError::Encoding(e.to_string()))?;
    if nonce.len() != NONCE_SIZE {
        return Err(StorageError::Corrupted(format!(
            "invalid nonce size: expected {}, got {}",
            NONCE_SIZE,
            nonce.len()
        )));
    }
    let ciphertext = BASE64
        .decode(&sealed.ciphertext)
        .map_err(|e| StorageError::Encoding(e.to_string()))?;

    let cipher = ChaCha20Poly1305::new_from_slice(cipher_key)
        .map_err(|e| StorageError::Platform(e.to_string()))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| {
            StorageError::Corrupted(
                "keystore could not be decrypted with the local master key".to_string(),
            )
        })?;

    serde_json::from_slice(&plaintext).map_err(|e| StorageError::Encoding(e.to_string()))
}

/// Write to a sibling temp file, then rename over `path`.
fn write_atomically(path: &Path, contents: &[u8]) -> StorageResult<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = create_private_file(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(unix)]
fn create_private_file(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private_file(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::File::create(path)
}
