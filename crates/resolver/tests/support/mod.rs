use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::container::CONTAINER_METADATA_FILE;

pub(crate) fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after unix epoch")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("residue-{prefix}-{nanos}"));
    fs::create_dir_all(&path).expect("temp dir should be created");
    path
}

pub(crate) fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, b"x").expect("fixture file should be written");
}

/// XML plist whose top-level dictionary holds the given string pairs.
pub(crate) fn xml_plist(pairs: &[(&str, &str)]) -> String {
    let body = pairs
        .iter()
        .map(|(key, value)| format!("  <key>{key}</key>\n  <string>{value}</string>\n"))
        .collect::<String>();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<plist version=\"1.0\">\n<dict>\n{body}</dict>\n</plist>\n"
    )
}

/// Creates `<root>/<dir_name>` with a container metadata file naming `owner`.
pub(crate) fn write_container(root: &Path, dir_name: &str, owner: &str) -> PathBuf {
    let container = root.join(dir_name);
    fs::create_dir_all(container.join("Data")).expect("container dir should be created");
    fs::write(
        container.join(CONTAINER_METADATA_FILE),
        xml_plist(&[("MCMMetadataIdentifier", owner)]),
    )
    .expect("container metadata should be written");
    container
}
