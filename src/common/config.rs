use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "middleman_data";
pub const DEFAULT_LIST_PAGE_SIZE: usize = 10;
pub const DEFAULT_REQUEST_CHANNEL_SIZE: usize = 10;

const TRANSACTIONS_DIR: &str = "transactions";

#[derive(Clone, Debug)]
pub struct ManagerConfig {
    data_dir: PathBuf,
    list_page_size: usize,
    request_channel_size: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            request_channel_size: DEFAULT_REQUEST_CHANNEL_SIZE,
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_dir(&mut self, data_dir: impl AsRef<Path>) -> &mut Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    /// Maximum number of transactions returned by a single listing. Zero is treated as one.
    pub fn list_page_size(&mut self, list_page_size: usize) -> &mut Self {
        self.list_page_size = list_page_size.max(1);
        self
    }

    pub fn request_channel_size(&mut self, request_channel_size: usize) -> &mut Self {
        self.request_channel_size = request_channel_size.max(1);
        self
    }

    pub(crate) fn transactions_dir(&self) -> PathBuf {
        self.data_dir.join(TRANSACTIONS_DIR)
    }

    pub(crate) fn page_size(&self) -> usize {
        self.list_page_size
    }

    pub(crate) fn channel_size(&self) -> usize {
        self.request_channel_size
    }
}
