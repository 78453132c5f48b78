//! EEPROM database for runtime loading and lookup
//!
//! A `ChipDatabase` starts out with the built-in catalog and can be extended
//! with part definitions from RON files. A loaded definition replaces a
//! built-in part of the same name.
//!
//! ```ron
//! (
//!     chips: [
//!         (name: "m24m01", size: KiB(128), page_size: 256, addr_width: 2, addr_mask: 1),
//!     ],
//! )
//! ```

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

use super::types::EepromChip;
use super::CHIPS;

/// Error type for chip database operations
#[derive(Debug, thiserror::Error)]
pub enum ChipDbError {
    /// I/O error reading files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// RON parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
}

impl Size {
    /// Convert to bytes, `None` if the size does not fit in a `u32`
    pub fn to_bytes(self) -> Option<u32> {
        match self {
            Size::B(n) => Some(n),
            Size::KiB(n) => n.checked_mul(1024),
        }
    }
}

/// Single part definition in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct ChipDef {
    name: String,
    size: Size,
    page_size: u16,
    addr_width: u8,
    #[serde(default)]
    addr_mask: u8,
}

/// File-level wrapper
#[derive(Debug, Clone, serde::Deserialize)]
struct ChipFileDef {
    chips: Vec<ChipDef>,
}

// ============================================================================
// Chip database
// ============================================================================

/// Runtime EEPROM database
#[derive(Debug, Clone)]
pub struct ChipDatabase {
    chips: Vec<EepromChip>,
}

impl Default for ChipDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipDatabase {
    /// Create a database holding the built-in catalog
    pub fn new() -> Self {
        Self {
            chips: CHIPS.to_vec(),
        }
    }

    /// Create a database with no parts at all
    pub fn empty() -> Self {
        Self { chips: Vec::new() }
    }

    /// Load part definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ChipDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load part definitions from a RON string
    pub fn load_ron(&mut self, content: &str) -> Result<usize, ChipDbError> {
        let file: ChipFileDef = ron::from_str(content)?;

        // Validate everything before touching the database
        let mut parsed = Vec::with_capacity(file.chips.len());
        for def in file.chips {
            let size = def.size.to_bytes().ok_or_else(|| {
                ChipDbError::Validation(format!("{}: size {:?} is too large", def.name, def.size))
            })?;
            let chip = EepromChip {
                name: Cow::Owned(def.name),
                size,
                page_size: def.page_size,
                addr_width: def.addr_width,
                addr_mask: def.addr_mask,
            };
            chip.validate().map_err(ChipDbError::Validation)?;
            parsed.push(chip);
        }

        let count = parsed.len();
        for chip in parsed {
            self.insert(chip);
        }
        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ChipDbError> {
        let mut total = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                total += self.load_file(&path)?;
            }
        }

        Ok(total)
    }

    /// Add a part, replacing any existing part with the same name
    pub fn insert(&mut self, chip: EepromChip) {
        match self.chips.iter_mut().find(|c| c.name == chip.name) {
            Some(existing) => {
                log::debug!("Overriding definition of {}", chip.name);
                *existing = chip;
            }
            None => self.chips.push(chip),
        }
    }

    /// Find a part by exact, case-sensitive name
    pub fn find(&self, name: &str) -> Option<&EepromChip> {
        self.chips.iter().find(|c| c.name == name)
    }

    /// Get all parts in the database
    pub fn chips(&self) -> &[EepromChip] {
        &self.chips
    }

    /// Get the number of parts in the database
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }
}
