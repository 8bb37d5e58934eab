//! Tail reader for the admin log viewer.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

pub const DEFAULT_LINES: usize = 100;
pub const MAX_LINES: usize = 1000;

/// Returns the last `count` lines of the file, oldest first.
pub fn tail_lines(path: &Path, count: usize) -> io::Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut tail = VecDeque::with_capacity(count);
    for line in reader.lines() {
        if tail.len() == count {
            tail.pop_front();
        }
        if count > 0 {
            tail.push_back(line?);
        }
    }
    Ok(tail.into())
}
