use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes `contents` to a file that must not exist yet.
pub(crate) fn write_new(path: &Path, contents: &[u8], secret: bool) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    restrict_permissions(&mut options, secret);
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Writes `contents`, truncating whatever was at `path`.
pub(crate) fn write_replacing(path: &Path, contents: &[u8], secret: bool) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    restrict_permissions(&mut options, secret);
    let mut file = options.open(path)?;
    // the open mode only applies when the file is created
    if secret {
        restrict_existing(&file)?;
    }
    file.write_all(contents)?;
    file.sync_all()
}

/// `Ok(false)` only for a missing entry; other stat failures propagate.
pub(crate) fn exists(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(error) => Err(error),
    }
}

#[cfg(unix)]
fn restrict_permissions(options: &mut OpenOptions, secret: bool) {
    use std::os::unix::fs::OpenOptionsExt;

    if secret {
        options.mode(0o600);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_options: &mut OpenOptions, _secret: bool) {}

#[cfg(unix)]
fn restrict_existing(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_existing(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{exists, write_new, write_replacing};

    #[test]
    fn write_new_refuses_to_clobber() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("file.pem");
        write_new(&path, b"first", false).expect("first write");
        let error = write_new(&path, b"second", false).expect_err("second write must fail");
        assert_eq!(error.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&path).expect("read"), b"first");
    }

    #[test]
    fn write_replacing_truncates_existing_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("file.pem");
        write_replacing(&path, b"a much longer first body", false).expect("first write");
        write_replacing(&path, b"short", false).expect("second write");
        assert_eq!(fs::read(&path).expect("read"), b"short");
    }

    #[cfg(unix)]
    #[test]
    fn secret_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("key.pem");
        write_new(&path, b"secret", true).expect("write");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[cfg(unix)]
    #[test]
    fn replacing_a_readable_secret_tightens_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("key.pem");
        fs::write(&path, b"old key").expect("seed");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

        write_replacing(&path, b"new key", true).expect("replace");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read(&path).expect("read"), b"new key");
    }

    #[test]
    fn exists_distinguishes_missing_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(exists(dir.path()).expect("stat dir"));
        assert!(!exists(&dir.path().join("missing")).expect("stat missing"));
    }
}
