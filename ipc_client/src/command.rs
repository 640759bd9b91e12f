//! Argument construction for `akavecli ipc ...` invocations.
//!
//! Every argument is a separate list item handed straight to the process
//! spawner, so names and paths are never shell-escaped.

use std::path::Path;

use crate::{credentials::Credentials, parser::ParserKind};

const DOMAIN: &str = "ipc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcCommand<'a> {
    CreateBucket {
        bucket: &'a str,
    },
    DeleteBucket {
        bucket: &'a str,
    },
    ViewBucket {
        bucket: &'a str,
    },
    ListBuckets,
    ListFiles {
        bucket: &'a str,
    },
    FileInfo {
        bucket: &'a str,
        file: &'a str,
    },
    UploadFile {
        bucket: &'a str,
        path: &'a Path,
    },
    DownloadFile {
        bucket: &'a str,
        file: &'a str,
        destination: &'a Path,
    },
}

impl IpcCommand<'_> {
    pub fn entity(&self) -> &'static str {
        match self {
            Self::CreateBucket { .. } |
            Self::DeleteBucket { .. } |
            Self::ViewBucket { .. } |
            Self::ListBuckets => "bucket",
            Self::ListFiles { .. } |
            Self::FileInfo { .. } |
            Self::UploadFile { .. } |
            Self::DownloadFile { .. } => "file",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::CreateBucket { .. } => "create",
            Self::DeleteBucket { .. } => "delete",
            Self::ViewBucket { .. } => "view",
            Self::ListBuckets | Self::ListFiles { .. } => "list",
            Self::FileInfo { .. } => "info",
            Self::UploadFile { .. } => "upload",
            Self::DownloadFile { .. } => "download",
        }
    }

    pub fn parser_kind(&self) -> ParserKind {
        match self {
            Self::CreateBucket { .. } => ParserKind::CreateBucket,
            Self::DeleteBucket { .. } => ParserKind::DeleteBucket,
            Self::ViewBucket { .. } => ParserKind::ViewBucket,
            Self::ListBuckets => ParserKind::ListBuckets,
            Self::ListFiles { .. } => ParserKind::ListFiles,
            Self::FileInfo { .. } => ParserKind::FileInfo,
            Self::UploadFile { .. } => ParserKind::UploadFile,
            Self::DownloadFile { .. } => ParserKind::DownloadFile,
        }
    }

    /// Full argument list, ending with the node address and private key
    /// flags.
    pub fn args(&self, credentials: &Credentials) -> Vec<String> {
        let mut args = vec![
            DOMAIN.to_string(),
            self.entity().to_string(),
            self.verb().to_string(),
        ];
        match self {
            Self::ListBuckets => {}
            Self::CreateBucket { bucket } |
            Self::DeleteBucket { bucket } |
            Self::ViewBucket { bucket } |
            Self::ListFiles { bucket } => args.push(bucket.to_string()),
            Self::FileInfo { bucket, file } => {
                args.push(bucket.to_string());
                args.push(file.to_string());
            }
            Self::UploadFile { bucket, path } => {
                args.push(bucket.to_string());
                args.push(path.to_string_lossy().into_owned());
            }
            Self::DownloadFile {
                bucket,
                file,
                destination,
            } => {
                args.push(bucket.to_string());
                args.push(file.to_string());
                args.push(destination.to_string_lossy().into_owned());
            }
        }
        args.push(format!("--node-address={}", credentials.node_address()));
        args.push(format!("--private-key={}", credentials.private_key()));
        args
    }
}
