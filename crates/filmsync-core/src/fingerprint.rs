use filmsync_models::{Action, WorkItem};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Bumped whenever the canonical encoding changes, so old ledgers stop matching
const ENCODING_VERSION: &str = "filmsync-workitem/1";

/// SHA-256 digest identifying a work item's content
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    fn from_digest(digest: &[u8]) -> Option<Self> {
        let bytes: [u8; 32] = digest.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s.trim()).ok()?;
        Self::from_digest(&bytes)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..12])
    }
}

/// Content hash of a work item: action tag and payload, record fields and
/// extra fields, each map walked in key order. Pure and infallible.
pub fn fingerprint(item: &WorkItem) -> Fingerprint {
    let mut hasher = Sha256::new();
    put(&mut hasher, ENCODING_VERSION);
    put(&mut hasher, item.kind().tag());

    match item.action() {
        Action::Rate { rating } => put(&mut hasher, &rating.value().to_string()),
        Action::AddToWatchlist => put(&mut hasher, ""),
        Action::AddToList { list_id } => put(&mut hasher, list_id.as_str()),
    }

    put_map(&mut hasher, item.record().fields());
    put_map(&mut hasher, item.extra());

    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Fingerprint(bytes)
}

// Length prefixes keep ("ab", "c") and ("a", "bc") apart
fn put(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn put_map(hasher: &mut Sha256, map: &BTreeMap<String, String>) {
    hasher.update((map.len() as u64).to_le_bytes());
    for (key, value) in map {
        put(hasher, key);
        put(hasher, value);
    }
}
