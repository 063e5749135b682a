//! Per-folder playback progress
//!
//! One byte per folder, stored at the offset equal to the folder number.
//! Only the audiobook mode reads or writes it. A stored value of 0 means
//! "no progress recorded".

use crate::error::{Result, TagplayError};
use crate::traits::NonVolatile;
use crate::types::MAX_FOLDER;

/// Storage offset of the progress table (entry for folder `n` at `n`)
pub const PROGRESS_OFFSET: usize = 0;

fn address(folder: u8) -> Result<usize> {
    if folder == 0 || folder > MAX_FOLDER {
        return Err(TagplayError::invalid_choice(format!(
            "folder {} has no progress entry",
            folder
        )));
    }
    Ok(PROGRESS_OFFSET + folder as usize)
}

/// Last recorded track of `folder` (0 if none)
pub fn last_track(storage: &mut dyn NonVolatile, folder: u8) -> Result<u8> {
    let addr = address(folder)?;
    let mut byte = [0u8; 1];
    storage.read(addr, &mut byte)?;
    Ok(byte[0])
}

/// Record `track` as the position of `folder`
pub fn remember(storage: &mut dyn NonVolatile, folder: u8, track: u8) -> Result<()> {
    let addr = address(folder)?;
    let mut current = [0u8; 1];
    storage.read(addr, &mut current)?;
    // avoid wearing the cell when nothing changed
    if current[0] == track {
        return Ok(());
    }
    storage.write(addr, &[track])
}

/// Forget the progress of every folder
pub fn clear(storage: &mut dyn NonVolatile) -> Result<()> {
    let zeros = [0u8; MAX_FOLDER as usize];
    storage.write(PROGRESS_OFFSET + 1, &zeros)
}
