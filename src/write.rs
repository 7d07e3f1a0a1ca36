//! Write command lists and scripts to disk

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::info;

use crate::error::{Error, Result};

/// Create `path` or truncate it to zero length
pub fn clear_file(path: &Path) -> Result<()> {
    info!("Clearing {}", path.display());
    File::create(path).map_err(Error::io(path))?;
    Ok(())
}

/// Append each command to `path` on its own line, creating the file if needed
///
/// A single command can be passed as `[cmd]` or `Some(cmd)`.
pub fn write_commands<I>(path: &Path, commands: I) -> Result<usize>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(Error::io(path))?;

    // an unterminated last line would merge with the first new command
    if !ends_with_newline(&mut file).map_err(Error::io(path))? {
        writeln!(file).map_err(Error::io(path))?;
    }

    let mut written = 0;
    for cmd in commands {
        writeln!(file, "{}", cmd.as_ref()).map_err(Error::io(path))?;
        written += 1;
    }

    info!("Appended {written} commands to {}", path.display());
    Ok(written)
}

/// True for an empty file or one whose last byte is `\n`
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Write a complete script, replacing whatever was at `path`
pub fn write_batch_script(path: &Path, contents: &str) -> Result<()> {
    info!("Writing job script to {}", path.display());
    fs::write(path, contents).map_err(Error::io(path))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn commands_are_appended() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("commands.txt");

        assert_eq!(write_commands(&path, ["brainreg a", "brainreg b"]).unwrap(), 2);
        assert_eq!(write_commands(&path, Some("brainreg c")).unwrap(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "brainreg a\nbrainreg b\nbrainreg c\n");
    }

    #[test]
    fn unterminated_last_line_is_closed_first() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("commands.txt");
        fs::write(&path, "brainreg a").unwrap();

        write_commands(&path, ["brainreg b"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "brainreg a\nbrainreg b\n");
    }

    #[test]
    fn clear_truncates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("commands.txt");
        write_commands(&path, vec![String::from("old")]).unwrap();

        clear_file(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        let fresh = tmp.path().join("fresh.txt");
        clear_file(&fresh).unwrap();
        assert!(fresh.exists());
    }

    #[test]
    fn script_is_overwritten() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("array.sh");
        write_batch_script(&path, "#!/bin/bash\necho one\n").unwrap();
        write_batch_script(&path, "#!/bin/bash\necho two\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "#!/bin/bash\necho two\n");
    }

    #[test]
    fn missing_parent_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope/commands.txt");
        assert!(matches!(write_commands(&path, ["x"]), Err(Error::Io { .. })));
    }
}
