//! JSON-lines output
//!
//! One JSON object per line, UTF-8, flushed at the end of a command.

use std::io::Write;

use serde::Serialize;

use super::errors::CliResult;

/// Write one value as a single line
pub fn write_json_line<W: Write + ?Sized, T: Serialize>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_object_per_line() {
        let mut out = Vec::new();
        write_json_line(&mut out, &serde_json::json!({"pos": [1, 2]})).unwrap();
        write_json_line(&mut out, &serde_json::json!({"pos": [3, 4]})).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"pos\":[1,2]}\n{\"pos\":[3,4]}\n"
        );
    }
}
