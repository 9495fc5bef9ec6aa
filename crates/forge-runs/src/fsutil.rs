//! Atomic file write helper shared by the manifest and the filesystem
//! cache: write-to-temp, fsync, rename (spec.md §4.1's durability
//! discipline, generalized from the teacher's checkpoint-writer idiom in
//! `chem-persistence`).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or("tmp");
    let tmp_path = dir.join(format!(".{file_name}.tmp-{}", std::process::id()));
    {
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
