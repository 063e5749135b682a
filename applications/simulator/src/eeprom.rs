//! EEPROM image files

use crate::error::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Value of an erased EEPROM cell
pub const ERASED: u8 = 0xff;

/// A blank (erased) image
pub fn blank(size: usize) -> Vec<u8> {
    vec![ERASED; size]
}

/// Load an image, or a blank one if `path` is unset or missing
///
/// Short files are padded with erased cells up to `size`; longer files are
/// kept whole.
pub fn load(path: Option<&Path>, size: usize) -> Result<Vec<u8>> {
    let Some(path) = path else {
        return Ok(blank(size));
    };
    if !path.exists() {
        debug!(path = %path.display(), "No EEPROM image yet, starting blank");
        return Ok(blank(size));
    }

    let mut image = std::fs::read(path)?;
    if image.len() < size {
        warn!(
            path = %path.display(),
            len = image.len(),
            size,
            "EEPROM image shorter than configured, padding"
        );
        image.resize(size, ERASED);
    }
    Ok(image)
}

/// Write an image back to disk
pub fn save(path: &Path, image: &[u8]) -> Result<()> {
    std::fs::write(path, image)?;
    debug!(path = %path.display(), len = image.len(), "EEPROM image saved");
    Ok(())
}
