use std::path::{Path, PathBuf};

pub const EXPLORER_DIR: &str = ".trigger-explorer";
pub const CONFIG_FILE: &str = ".trigger-explorer/config.yaml";
pub const SELECTION_FILE: &str = ".trigger-explorer/selection.json";

pub fn explorer_dir(root: &Path) -> PathBuf {
    root.join(EXPLORER_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn selection_path(root: &Path) -> PathBuf {
    root.join(SELECTION_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/org");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/org/.trigger-explorer/config.yaml")
        );
        assert_eq!(
            selection_path(root),
            PathBuf::from("/tmp/org/.trigger-explorer/selection.json")
        );
    }
}
