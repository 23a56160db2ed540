//! Hexadecimal rendering for log records.

use std::fmt;

/// Uppercase, space-separated hex rendering of a byte slice, formatted
/// lazily so disabled log levels cost nothing.
///
/// Example: `LogHex(&[0xe0, 0x80])` displays as `"E0 80"`
#[derive(Clone, Copy)]
pub struct LogHex<'a>(pub &'a [u8]);

impl fmt::Display for LogHex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for LogHex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
