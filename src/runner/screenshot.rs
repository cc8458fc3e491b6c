//! Screenshot file naming and capture

use std::path::{Path, PathBuf};

use crate::browser::BrowserDriver;
use crate::core::Result;

/// Directory that receives timestamped screenshots
#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    dir: PathBuf,
}

impl ScreenshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<label>_<YYYYmmdd_HHMMSS>.png`
    pub fn path_for(&self, label: &str) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.dir.join(format!("{}_{}.png", label, stamp))
    }

    /// Capture the current viewport under `label`
    pub async fn capture<D>(&self, driver: &D, label: &str) -> Result<PathBuf>
    where
        D: BrowserDriver + ?Sized,
    {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(label);
        driver.screenshot(&path).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{ScriptedBrowser, ScriptedPage};

    #[test]
    fn test_path_for_label() {
        let store = ScreenshotStore::new("shots");
        let path = store.path_for("01_page_loaded");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert!(path.starts_with("shots"));
        assert!(name.starts_with("01_page_loaded_"));
        assert!(name.ends_with(".png"));
        // label + '_' + 15-char stamp + ".png"
        assert_eq!(name.len(), "01_page_loaded_".len() + 15 + 4);
    }

    #[tokio::test]
    async fn test_capture_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path().join("screens"));
        let driver = ScriptedBrowser::new(ScriptedPage::new("t"));

        let path = store.capture(&driver, "99_final_state").await.unwrap();

        assert!(store.dir().is_dir());
        let handle = driver.handle();
        let state = handle.lock().unwrap();
        assert_eq!(state.screenshots, vec![path]);
    }
}
