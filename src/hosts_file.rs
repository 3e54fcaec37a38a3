//! Managed block inside a hosts file.
//!
//! The tool owns exactly one region of the file, delimited by marker lines.
//! Everything outside the markers belongs to the user or the OS and is
//! written back byte for byte.

use std::io::Write;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// First line of the managed block.
pub const BLOCK_START: &str = "# generated using k8s-ingress-hosts start #";

/// Last line of the managed block.
pub const BLOCK_END: &str = "# generated using k8s-ingress-hosts end #";

/// A hosts file holding a managed block.
///
/// # Example
///
/// ```rust,no_run
/// use k8s_ingress_hosts::HostsFile;
///
/// let hosts = HostsFile::new("/etc/hosts");
/// hosts.write_block("10.0.0.5 api.local  # api\n")?;
/// # Ok::<(), k8s_ingress_hosts::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct HostsFile {
    path: PathBuf,
}

impl HostsFile {
    /// Targets the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the managed block with `body`, appending a block if the
    /// file has none.
    ///
    /// The file is rewritten in place, so symlinks and bind mounts keep
    /// pointing at the same inode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostFile`] if the file cannot be read (it must
    /// already exist) or written.
    pub fn write_block(&self, body: &str) -> Result<()> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let updated = splice_block(&content, body);
        std::fs::write(&self.path, updated).map_err(|e| self.io_error(e))?;

        tracing::info!(
            path = %self.path.display(),
            lines = body.lines().count(),
            "Updated hosts file block"
        );
        Ok(())
    }

    /// Returns the body of the managed block, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostFile`] if the file cannot be read.
    pub fn read_block(&self) -> Result<Option<String>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        Ok(find_block(&content).map(|range| block_body(&content[range]).to_string()))
    }

    /// Emits a rendered block: commits it to the file when `commit` is set,
    /// then echoes `body` to `out` either way.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HostFile`] from [`write_block`](Self::write_block)
    /// and [`Error::Io`] if `out` fails.
    pub fn publish<W: Write>(&self, body: &str, commit: bool, out: &mut W) -> Result<()> {
        if commit {
            self.write_block(body)?;
        } else {
            tracing::debug!(path = %self.path.display(), "Preview only, hosts file untouched");
        }
        out.write_all(body.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::HostFile {
            path: self.path.clone(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Block helpers
// ---------------------------------------------------------------------------

/// Wraps `body` in the block markers.
///
/// ```text
/// # generated using k8s-ingress-hosts start #
/// 10.0.0.5 foo.local  # foo-svc
/// # generated using k8s-ingress-hosts end #
/// ```
///
/// No blank line precedes the end marker. Blocks written by older releases
/// carried one; they are still found and replaced since matching only
/// looks at the markers.
#[must_use]
pub fn build_block(body: &str) -> String {
    let newline = if body.is_empty() || body.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    format!("{BLOCK_START}\n{body}{newline}{BLOCK_END}\n")
}

/// Returns `content` with its managed block replaced by one wrapping
/// `body`, or with such a block appended if there is none.
#[must_use]
pub fn splice_block(content: &str, body: &str) -> String {
    let block = build_block(body);
    match find_block(content) {
        Some(range) => {
            let mut out = String::with_capacity(content.len() + block.len());
            out.push_str(&content[..range.start]);
            out.push_str(&block);
            out.push_str(&content[range.end..]);
            out
        }
        None => {
            let mut out = String::with_capacity(content.len() + block.len() + 1);
            out.push_str(content);
            if !content.is_empty() && !content.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&block);
            out
        }
    }
}

/// Locates the managed block: first start marker through the last end
/// marker after it, including the end marker's newline when present.
fn find_block(content: &str) -> Option<Range<usize>> {
    let start = content.find(BLOCK_START)?;
    let from = start + BLOCK_START.len();
    let end_at = from + content[from..].rfind(BLOCK_END)?;
    let mut end = end_at + BLOCK_END.len();
    if content[end..].starts_with("\r\n") {
        end += 2;
    } else if content[end..].starts_with('\n') {
        end += 1;
    }
    Some(start..end)
}

/// Strips the marker lines from a block found by [`find_block`].
fn block_body(block: &str) -> &str {
    let inner = block
        .strip_prefix(BLOCK_START)
        .unwrap_or(block)
        .trim_end_matches(['\r', '\n']);
    let inner = inner.strip_suffix(BLOCK_END).unwrap_or(inner);
    inner.strip_prefix('\n').unwrap_or(inner)
}
