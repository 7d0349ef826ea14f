//! File outbox delivery.
//!
//! Each digest becomes one Markdown file `<outbox>/<timestamp>-<ulid>.md`,
//! ready for a mail relay or a human to pick up.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;
use ulid::Ulid;

use curator_core::{ComposedDigest, CuratorError, DeliveryReceipt, DigestDelivery};

/// Writes digests into a directory.
#[derive(Debug, Clone)]
pub struct OutboxDelivery {
    dir: PathBuf,
}

impl OutboxDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn render(digest: &ComposedDigest) -> String {
    format!(
        "---\nsubject: {}\ntheme: {}\n---\n\n{}\n",
        digest.subject, digest.theme, digest.body
    )
}

impl DigestDelivery for OutboxDelivery {
    fn deliver(&self, digest: &ComposedDigest) -> Result<DeliveryReceipt, CuratorError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            CuratorError::Delivery(format!("cannot create outbox {:?}: {}", self.dir, e))
        })?;

        let file_name = format!("{}-{}.md", Utc::now().format("%Y%m%dT%H%M%SZ"), Ulid::new());
        let path = self.dir.join(&file_name);
        fs::write(&path, render(digest))
            .map_err(|e| CuratorError::Delivery(format!("cannot write {:?}: {}", path, e)))?;

        debug!(path = ?path, "Digest written to outbox");
        Ok(DeliveryReceipt {
            location: path.to_string_lossy().into_owned(),
        })
    }
}
