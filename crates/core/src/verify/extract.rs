use crate::error::{Result, VigilError};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Unpack the single regular-file entry `entry_name` from a `.tar.gz` into
/// `dest_dir`, replacing any existing file. Other entries are skipped.
///
/// Blocking; call from `spawn_blocking`.
pub fn extract_entry(archive: &Path, entry_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    let reader = BufReader::new(File::open(archive)?);
    let mut tarball = tar::Archive::new(GzDecoder::new(reader));
    tarball.set_overwrite(true);

    for entry in tarball.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.into_owned();
        let relative = path.strip_prefix(".").unwrap_or(&path);
        if relative != Path::new(entry_name) {
            continue;
        }

        let dest = dest_dir.join(entry_name);
        entry.unpack(&dest)?;
        mark_executable(&dest)?;
        return Ok(dest);
    }

    Err(VigilError::ArchiveEntryNotFound {
        archive: archive.display().to_string(),
        entry: entry_name.to_string(),
    })
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extracts_only_named_entry() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("release.tar.gz");
        write_archive(
            &archive,
            &[
                ("LICENSE", &b"license text"[..]),
                ("./grype", &b"binary"[..]),
                ("README.md", &b"readme"[..]),
            ],
        );

        let out = temp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let dest = extract_entry(&archive, "grype", &out).unwrap();

        assert_eq!(dest, out.join("grype"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"binary");
        assert!(!out.join("LICENSE").exists());
        assert!(!out.join("README.md").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("release.tar.gz");
        write_archive(&archive, &[("grype", &b"fresh"[..])]);
        std::fs::write(temp.path().join("grype"), b"stale and longer").unwrap();

        extract_entry(&archive, "grype", temp.path()).unwrap();
        assert_eq!(std::fs::read(temp.path().join("grype")).unwrap(), b"fresh");
    }

    #[test]
    fn test_missing_entry() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("release.tar.gz");
        write_archive(&archive, &[("syft", &b"other tool"[..])]);

        let err = extract_entry(&archive, "grype", temp.path()).unwrap_err();
        assert!(matches!(err, VigilError::ArchiveEntryNotFound { .. }));
    }
}
