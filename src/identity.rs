//! The anonymous local identity used as this client's key in the party document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::prelude::*;
use tracing::info;

use crate::config;
use crate::error::Result;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 7;

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// A fresh opaque user id: `u_` + base-36 milliseconds + random base-36 tail.
pub fn generate_user_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let mut rng = thread_rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("u_{}{}", to_base36(millis), suffix)
}

/// A user id persisted in a small file so it survives restarts.
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    path: PathBuf,
    user_id: String,
}

impl LocalIdentity {
    /// Read the id stored at `path`, creating and saving a new one when the
    /// file is missing or empty.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let stored = match fs::read_to_string(&path) {
            Ok(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        match stored {
            Some(user_id) => Ok(Self { path, user_id }),
            None => {
                let identity = Self {
                    path,
                    user_id: generate_user_id(),
                };
                identity.save()?;
                info!(path = %identity.path.display(), "created new local identity");
                Ok(identity)
            }
        }
    }

    /// [`load_or_create`](Self::load_or_create) at the platform config directory.
    pub fn load_default() -> Result<Self> {
        Self::load_or_create(config::default_identity_path())
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored id with a new one.
    pub fn regenerate(&mut self) -> Result<()> {
        self.user_id = generate_user_id();
        self.save()
    }

    /// Write through a temp file and rename, so a crash never leaves a
    /// truncated id behind.
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        let result = fs::write(&tmp, &self.user_id).and_then(|_| fs::rename(&tmp, &self.path));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        Ok(result?)
    }
}
