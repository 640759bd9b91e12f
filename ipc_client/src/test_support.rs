use std::{fs, io::Write, os::unix::fs::PermissionsExt, path::PathBuf};

use tempfile::TempDir;

/// Writes an executable shell script standing in for `akavecli`.
pub fn fake_cli(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("akavecli");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(file, "#!/bin/sh\n{}", body).unwrap();
    file.sync_all().unwrap();
    drop(file);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
