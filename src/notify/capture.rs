//! Failure artifacts: one file per participant whose notification failed,
//! holding the name they drew so it can be passed on by hand.

use std::path::{Path, PathBuf};

pub struct FailureCapture {
    dir: Option<PathBuf>,
}

impl FailureCapture {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Write `giftee` to `<dir>/<participant>.txt`.
    ///
    /// Returns the artifact path, or `None` when capture is disabled or the
    /// write failed.
    pub fn record(&self, participant: &str, giftee: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let path = dir.join(format!("{}.txt", file_stem(participant)));

        let written = std::fs::create_dir_all(dir).and_then(|()| std::fs::write(&path, giftee));
        match written {
            Ok(()) => {
                tracing::info!("Saved draw for {participant} to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!(
                    "Could not save draw for {participant} to {}: {e}",
                    path.display()
                );
                None
            }
        }
    }
}

/// Make a participant name safe to use as a file name.
///
/// Distinct names always give distinct stems: `%`, path separators,
/// reserved characters, control characters and a leading `.` are
/// percent-encoded, everything else is kept as-is.
pub fn file_stem(participant: &str) -> String {
    let mut stem = String::with_capacity(participant.len());
    for (i, ch) in participant.chars().enumerate() {
        match ch {
            '%' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => percent_encode(&mut stem, ch),
            '.' if i == 0 => percent_encode(&mut stem, ch),
            c if c.is_control() => percent_encode(&mut stem, c),
            c => stem.push(c),
        }
    }
    stem
}

fn percent_encode(out: &mut String, ch: char) {
    let mut buf = [0u8; 4];
    for byte in ch.encode_utf8(&mut buf).bytes() {
        out.push_str(&format!("%{byte:02X}"));
    }
}
