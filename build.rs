// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Object store flags accepted by every subcommand
fn store_args() -> Vec<Arg> {
    vec![
        Arg::new("s3_endpoint")
            .long("s3-endpoint")
            .value_name("ENDPOINT")
            .global(true)
            .help("S3 endpoint (host:port or URL)"),
        Arg::new("s3_access_key_id")
            .long("s3-access-key-id")
            .env("S3_ACCESS_KEY_ID")
            .global(true)
            .help("S3 access key id"),
        Arg::new("s3_secret_access_key")
            .long("s3-secret-access-key")
            .env("S3_SECRET_ACCESS_KEY")
            .global(true)
            .help("S3 secret access key"),
        Arg::new("s3_region").long("s3-region").global(true).help("S3 region"),
        Arg::new("s3_bucket")
            .long("s3-bucket")
            .global(true)
            .help("S3 bucket holding the profiles [default: default]"),
        Arg::new("store_dir")
            .long("store-dir")
            .value_name("DIR")
            .global(true)
            .help("Use a local directory as the object store instead of S3"),
        Arg::new("object_prefix")
            .long("object-prefix")
            .value_name("PREFIX")
            .global(true)
            .help("Top-level key prefix for profiles [default: profiles]"),
    ]
}

fn build_cli() -> Command {
    Command::new("pprof-vault")
        .version(env!("CARGO_PKG_VERSION"))
        .author("pprof-vault contributors")
        .about("Capture pprof profiles into object storage and serve them for analysis")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Path to a TOML configuration file"),
        )
        .args(store_args())
        .subcommand(
            Command::new("export")
                .about("Periodically capture profiles and upload them to the object store")
                .arg(Arg::new("source_url").long("source-url").value_name("URL").help("Base URL of the pprof endpoint"))
                .arg(Arg::new("profile_type").long("profile-type").help("Profile to capture (heap, goroutine, ...)"))
                .arg(Arg::new("debug").long("debug").help("Value passed as the debug query parameter"))
                .arg(
                    Arg::new("profile_duration_seconds")
                        .long("profile-duration-seconds")
                        .value_name("SECONDS")
                        .help("Sample duration of each profile, in seconds [default: 30]"),
                )
                .arg(
                    Arg::new("profile_delay_seconds")
                        .long("profile-delay-seconds")
                        .value_name("SECONDS")
                        .help("Delay between two captures, in seconds [default: 30]"),
                )
                .arg(Arg::new("keep_count").long("keep-count").help("Number of profiles to keep [default: 10]"))
                .arg(Arg::new("source_id").long("source-id").help("Source id used in object keys (default: host name)"))
                .arg(
                    Arg::new("once")
                        .long("once")
                        .action(ArgAction::SetTrue)
                        .help("Run a single capture cycle and exit"),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Serve every stored profile over HTTP")
                .arg(Arg::new("bind").long("bind").value_name("ADDR").help("Address to listen on [default: 127.0.0.1:4000]"))
                .arg(
                    Arg::new("scratch_dir")
                        .long("scratch-dir")
                        .value_name("DIR")
                        .help("Directory for downloaded profiles"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List stored profiles grouped by source")
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Output as JSON")),
        )
        .subcommand(
            Command::new("prune")
                .about("Delete the oldest profiles of a source beyond the keep count")
                .arg(Arg::new("source_id").long("source-id").required(true).help("Source whose profiles are pruned"))
                .arg(Arg::new("keep_count").long("keep-count").help("Number of profiles to keep")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("pprof-vault.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
