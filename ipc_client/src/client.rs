use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    command::IpcCommand,
    credentials::Credentials,
    error::{IpcError, Result},
    parser::CommandOutput,
    runner::CliRunner,
};

/// Bucket and file operations backed by `akavecli ipc`.
///
/// Holds one immutable set of credentials. Switching wallets means building
/// a new client; calls already running keep the client they started with.
#[derive(Debug, Clone)]
pub struct IpcClient {
    credentials: Credentials,
    runner: CliRunner,
}

impl IpcClient {
    pub fn new(credentials: Credentials, runner: CliRunner) -> Self {
        Self {
            credentials,
            runner,
        }
    }

    pub fn connect(node_address: &str, private_key: &str, cli_path: &Path) -> Result<Self> {
        let credentials = Credentials::new(node_address, private_key)?;
        Ok(Self::new(credentials, CliRunner::new(cli_path)))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn node_address(&self) -> &str {
        self.credentials.node_address()
    }

    async fn run(&self, command: IpcCommand<'_>) -> Result<CommandOutput> {
        let args = command.args(&self.credentials);
        self.runner.execute(&args, command.parser_kind()).await
    }

    pub async fn create_bucket(&self, bucket: &str) -> Result<CommandOutput> {
        self.run(IpcCommand::CreateBucket { bucket }).await
    }

    pub async fn delete_bucket(&self, bucket: &str) -> Result<CommandOutput> {
        self.run(IpcCommand::DeleteBucket { bucket }).await
    }

    pub async fn view_bucket(&self, bucket: &str) -> Result<CommandOutput> {
        self.run(IpcCommand::ViewBucket { bucket }).await
    }

    pub async fn list_buckets(&self) -> Result<CommandOutput> {
        self.run(IpcCommand::ListBuckets).await
    }

    pub async fn list_files(&self, bucket: &str) -> Result<CommandOutput> {
        self.run(IpcCommand::ListFiles { bucket }).await
    }

    pub async fn file_info(&self, bucket: &str, file: &str) -> Result<CommandOutput> {
        self.run(IpcCommand::FileInfo { bucket, file }).await
    }

    pub async fn upload_file(&self, bucket: &str, path: &Path) -> Result<CommandOutput> {
        self.run(IpcCommand::UploadFile { bucket, path }).await
    }

    /// Download `file` from `bucket` into `destination`.
    ///
    /// Returns the local path of the downloaded file,
    /// `destination/<normalized file name>`, once it exists and is readable.
    pub async fn download_file(
        &self,
        bucket: &str,
        file: &str,
        destination: &Path,
    ) -> Result<PathBuf> {
        self.run(IpcCommand::DownloadFile {
            bucket,
            file,
            destination,
        })
        .await?;

        let path = destination.join(normalize_file_name(file));
        if let Err(e) = tokio::fs::File::open(&path).await {
            warn!(path = %path.display(), error = %e, "downloaded file is not readable");
            return Err(IpcError::DownloadMissing { path });
        }
        info!(path = %path.display(), "file downloaded");
        Ok(path)
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn normalize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_file_name() {
        assert_eq!(normalize_file_name("report-2025.pdf"), "report-2025.pdf");
        assert_eq!(normalize_file_name("my file (1).txt"), "my_file__1_.txt");
        assert_eq!(normalize_file_name("../etc/passwd"), ".._etc_passwd");
        assert_eq!(normalize_file_name("café.txt"), "caf_.txt");
    }

    #[cfg(unix)]
    mod process {
        use tempfile::TempDir;

        use super::super::*;
        use crate::{parser::Record, test_support::fake_cli};

        const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

        fn client(cli: &Path) -> IpcClient {
            IpcClient::connect("127.0.0.1:5500", KEY, cli).unwrap()
        }

        #[tokio::test]
        async fn test_list_files() {
            let dir = TempDir::new().unwrap();
            let cli = fake_cli(
                &dir,
                "echo 'File: Name=a.txt, Size=1'\necho 'File: Name=b.txt, Size=2'",
            );
            let out = client(&cli).list_files("photos").await.unwrap();
            assert_eq!(
                out,
                CommandOutput::Records(vec![
                    Record::from_iter([("Name", "a.txt"), ("Size", "1")]),
                    Record::from_iter([("Name", "b.txt"), ("Size", "2")]),
                ])
            );
        }

        #[tokio::test]
        async fn test_credentials_reach_the_cli() {
            let dir = TempDir::new().unwrap();
            // echo the last two arguments back as a bucket record
            let cli = fake_cli(
                &dir,
                "for a in \"$@\"; do prev=$last; last=$a; done\necho \"Bucket: \
                 Node=${prev#--node-address=}, Key=${last#--private-key=}\"",
            );
            let out = client(&cli).view_bucket("b").await.unwrap();
            let rec = out.as_record().unwrap();
            assert_eq!(rec.get("Node"), Some("127.0.0.1:5500"));
            assert_eq!(rec.get("Key"), Some(KEY.trim_start_matches("0x")));
        }

        #[tokio::test]
        async fn test_download_creates_normalized_path() {
            let dir = TempDir::new().unwrap();
            let downloads = TempDir::new().unwrap();
            // $6 is the destination directory
            let cli = fake_cli(&dir, "printf 'hello' > \"$6/my_file.txt\"\necho done");
            let path = client(&cli)
                .download_file("b", "my file.txt", downloads.path())
                .await
                .unwrap();
            assert_eq!(path, downloads.path().join("my_file.txt"));
            assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
        }

        #[tokio::test]
        async fn test_download_without_file_is_an_error() {
            let dir = TempDir::new().unwrap();
            let downloads = TempDir::new().unwrap();
            let cli = fake_cli(&dir, "echo done");
            let err = client(&cli)
                .download_file("b", "missing.txt", downloads.path())
                .await
                .unwrap_err();
            assert!(matches!(err, IpcError::DownloadMissing { .. }));
            assert_eq!(
                err.to_string(),
                "File download failed or file is not readable"
            );
        }

        #[tokio::test]
        async fn test_failure_propagates_unchanged() {
            let dir = TempDir::new().unwrap();
            let cli = fake_cli(&dir, "echo 'insufficient funds'\nexit 1");
            let err = client(&cli).create_bucket("b").await.unwrap_err();
            assert_eq!(err.to_string(), "insufficient funds");
        }
    }
}
