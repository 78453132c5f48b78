//! Progress reporting for whole-EEPROM operations

/// Callback for progress reporting during read, write and scan
///
/// Byte counts passed to the `*_progress` methods only ever increase.
pub trait Progress {
    /// Called when starting to read the EEPROM
    fn reading(&mut self, total_bytes: usize);

    /// Called after each read chunk
    fn read_progress(&mut self, bytes_read: usize);

    /// Called when starting to write (or erase) the EEPROM
    fn writing(&mut self, total_bytes: usize);

    /// Called after each page write
    fn write_progress(&mut self, bytes_written: usize);

    /// Called when starting a bus scan
    fn scanning(&mut self, addresses: usize) {
        let _ = addresses;
    }

    /// Called after each probed address
    fn scan_progress(&mut self, probed: usize) {
        let _ = probed;
    }

    /// Called when the operation completed successfully
    fn complete(&mut self) {}
}

/// A no-op progress reporter
pub struct NoProgress;

impl Progress for NoProgress {
    fn reading(&mut self, _total_bytes: usize) {}
    fn read_progress(&mut self, _bytes_read: usize) {}
    fn writing(&mut self, _total_bytes: usize) {}
    fn write_progress(&mut self, _bytes_written: usize) {}
}

impl<P: Progress + ?Sized> Progress for &mut P {
    fn reading(&mut self, total_bytes: usize) {
        (**self).reading(total_bytes)
    }
    fn read_progress(&mut self, bytes_read: usize) {
        (**self).read_progress(bytes_read)
    }
    fn writing(&mut self, total_bytes: usize) {
        (**self).writing(total_bytes)
    }
    fn write_progress(&mut self, bytes_written: usize) {
        (**self).write_progress(bytes_written)
    }
    fn scanning(&mut self, addresses: usize) {
        (**self).scanning(addresses)
    }
    fn scan_progress(&mut self, probed: usize) {
        (**self).scan_progress(probed)
    }
    fn complete(&mut self) {
        (**self).complete()
    }
}
