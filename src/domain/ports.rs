use crate::utils::error::Result;

/// Filesystem access for one directory (input or output).
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Names of the plain files in the base directory, sorted.
    fn list_files(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn open_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<tokio::fs::File>> + Send;
}
