//! Plain identifier lists.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read a newline-separated list of identifiers.
///
/// Lines are taken literally (line terminators stripped, nothing else):
/// blank or padded lines become identifiers that simply match nothing.
/// Bytes that are not UTF-8 are replaced with `U+FFFD`, so such a line
/// is kept but cannot match a model identifier.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or read.
pub fn read_identifier_list(path: &Path) -> io::Result<BTreeSet<String>> {
    let reader = BufReader::new(File::open(path)?);
    reader
        .split(b'\n')
        .map(|line| {
            let mut line = line?;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            Ok(String::from_utf8_lossy(&line).into_owned())
        })
        .collect()
}
