use super::AuthStore;
use crate::error::IzumieError;
use async_trait::async_trait;
use izumie_schema::{Credentials, KeyEntries, KeyMutation, SessionSnapshot};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const CREDS_FILE: &str = "creds.json";
const KEYS_DIR: &str = "keys";

/// Directory layout:
///
/// ```text
/// <dir>/creds.json
/// <dir>/keys/<category>/<id>.json
/// ```
///
/// Category and id segments are escaped so any string maps to a single file name.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn creds_path(&self) -> PathBuf {
        self.dir.join(CREDS_FILE)
    }

    fn keys_dir(&self) -> PathBuf {
        self.dir.join(KEYS_DIR)
    }

    fn key_path(&self, category: &str, id: &str) -> PathBuf {
        self.keys_dir()
            .join(escape_segment(category))
            .join(format!("{}.json", escape_segment(id)))
    }
}

#[async_trait]
impl AuthStore for FileStore {
    async fn load_creds(&self) -> Result<Option<Credentials>, IzumieError> {
        let Some(raw) = read_optional(&self.creds_path()).await? else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(&raw)?;
        Ok(Credentials::from_value(value))
    }

    async fn save_creds(&self, creds: &Credentials) -> Result<(), IzumieError> {
        write_json(&self.creds_path(), &serde_json::to_vec(creds)?).await
    }

    async fn get_keys(&self, category: &str, ids: &[String]) -> Result<KeyEntries, IzumieError> {
        let mut found = KeyEntries::new();
        for id in ids {
            let path = self.key_path(category, id);
            let raw = match read_optional(&path).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable key file; treating as absent");
                    continue;
                }
            };
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    found.insert(id.clone(), value);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid key file; treating as absent");
                }
            }
        }
        Ok(found)
    }

    async fn mutate_keys(&self, mutation: &KeyMutation) -> Result<(), IzumieError> {
        for (category, id, value) in mutation.iter() {
            let path = self.key_path(category, id);
            match value {
                Some(value) => write_json(&path, &serde_json::to_vec(value)?).await?,
                None => match fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                },
            }
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<SessionSnapshot, IzumieError> {
        let creds = match self.load_creds().await {
            Ok(creds) => creds,
            Err(e) => {
                warn!(path = %self.creds_path().display(), error = %e, "failed to read creds");
                None
            }
        };

        let mut snapshot = SessionSnapshot {
            creds,
            ..Default::default()
        };

        let Some(mut categories) = read_dir_optional(&self.keys_dir()).await? else {
            return Ok(snapshot);
        };
        while let Some(category_entry) = categories.next_entry().await? {
            if !category_entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(category) = category_entry.file_name().to_str().map(unescape_segment)
            else {
                continue;
            };

            let mut files = fs::read_dir(category_entry.path()).await?;
            let mut entries = KeyEntries::new();
            while let Some(file) = files.next_entry().await? {
                let path = file.path();
                let Some(id) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .filter(|_| path.extension().is_some_and(|ext| ext == "json"))
                    .map(unescape_segment)
                else {
                    continue;
                };
                let raw = match fs::read_to_string(&path).await {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable key file");
                        continue;
                    }
                };
                match serde_json::from_str::<Value>(&raw) {
                    Ok(value) => {
                        entries.insert(id, value);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unparsable key file");
                    }
                }
            }
            if !entries.is_empty() {
                snapshot.keys.insert(category, entries);
            }
        }

        Ok(snapshot)
    }

    async fn clear(&self) -> Result<(), IzumieError> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                debug!(path = %self.dir.display(), "auth directory removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, IzumieError> {
    match fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_dir_optional(path: &Path) -> Result<Option<fs::ReadDir>, IzumieError> {
    match fs::read_dir(path).await {
        Ok(dir) => Ok(Some(dir)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes through a sibling temp file so readers never see a torn file.
async fn write_json(path: &Path, bytes: &[u8]) -> Result<(), IzumieError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Stands in for an empty segment; `%` is always escaped, so no other input produces it.
const EMPTY_SEGMENT: &str = "%00";

fn escape_segment(raw: &str) -> String {
    if raw.is_empty() {
        return EMPTY_SEGMENT.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            ':' => out.push_str("%3A"),
            '.' if out.is_empty() => out.push_str("%2E"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_segment(escaped: &str) -> String {
    if escaped == EMPTY_SEGMENT {
        return String::new();
    }
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3);
        let decoded = match code {
            Some("25") => Some('%'),
            Some("2F") => Some('/'),
            Some("5C") => Some('\\'),
            Some("3A") => Some(':'),
            Some("2E") => Some('.'),
            _ => None,
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[pos + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
