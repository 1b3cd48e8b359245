use gonka_light_api::Transport;
use gonka_light_core::FetchError;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Serves saved responses from a directory, one JSON file per request path:
/// `v1/epochs/3/participants` → `v1/epochs/3/participants.json`,
/// `chain-rpc/block?height=310` → `chain-rpc/block_height_310.json`.
pub struct DirTransport {
    root: PathBuf,
}

impl DirTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn file_for(&self, path: &str) -> PathBuf {
        let name: String = path
            .trim_start_matches('/')
            .chars()
            .map(|c| match c {
                '?' | '&' | '=' => '_',
                c => c,
            })
            .collect();
        self.root.join(format!("{}.json", name))
    }
}

impl Transport for DirTransport {
    fn get(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let file = self.file_for(path);
        std::fs::read(&file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound(file.display().to_string()),
            _ => FetchError::Transport(format!("{}: {}", file.display(), e)),
        })
    }
}
