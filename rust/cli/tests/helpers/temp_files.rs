use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub struct TempFileManager {
    base_dir: PathBuf,
}

impl TempFileManager {
    pub fn new() -> Self {
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut base = PathBuf::from("target");
        base.push(format!("bgo_{}_{}", std::process::id(), unique));
        fs::create_dir_all(&base).expect("create temp dir");
        Self { base_dir: base }
    }

    pub fn path<P: AsRef<Path>>(&self, name: P) -> PathBuf {
        self.base_dir.join(name)
    }

    pub fn create_file<P: AsRef<Path>>(&self, name: P, content: &str) -> PathBuf {
        let p = self.path(name);
        fs::write(&p, content).expect("write temp file");
        p
    }
}

impl Drop for TempFileManager {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.base_dir);
    }
}
