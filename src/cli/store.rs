// src/cli/store.rs
//! Object store flags shared by every command

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct StoreArgs {
    /// S3 endpoint (host:port or URL)
    #[arg(long, global = true, value_name = "ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// S3 access key id
    #[arg(long, global = true, env = "S3_ACCESS_KEY_ID", hide_env_values = true)]
    pub s3_access_key_id: Option<String>,

    /// S3 secret access key
    #[arg(long, global = true, env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub s3_secret_access_key: Option<String>,

    /// S3 region
    #[arg(long, global = true)]
    pub s3_region: Option<String>,

    /// S3 bucket holding the profiles [default: default]
    #[arg(long, global = true)]
    pub s3_bucket: Option<String>,

    /// Use a local directory as the object store instead of S3
    #[arg(long, global = true, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Top-level key prefix for profiles [default: profiles]
    #[arg(long, global = true, value_name = "PREFIX")]
    pub object_prefix: Option<String>,
}
