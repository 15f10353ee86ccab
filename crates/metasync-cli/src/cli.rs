//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;
use metasync::SyncConfig;

/// Sync folders with an object store, transferring only changed files.
///
/// Each side is either a local directory or CONTAINER:PREFIX naming a
/// location in the object store. The destination is made identical to the
/// source: new and changed files are copied, files missing from the source
/// are deleted.
///
/// Examples:
///   metasync public assets:www        # upload
///   metasync assets:www /var/www      # download
///   metasync --dry-run public assets:www
#[derive(Parser, Debug)]
#[command(name = "metasync")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Where to read from (local path or CONTAINER:PREFIX)
    pub source: String,

    /// What to make identical to the source
    pub destination: String,

    /// Directory backing the object store; each container is a subdirectory
    #[arg(long, env = "METASYNC_STORE_ROOT", default_value = ".metasync-store")]
    pub store_root: PathBuf,

    /// Maximum number of files transferred at once
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    /// Name of the manifest file kept at the root of each synced tree
    #[arg(long, default_value = metasync::DEFAULT_MANIFEST_NAME, value_parser = parse_manifest_name)]
    pub manifest_name: String,

    /// Access key for the object store
    #[arg(long, env = "METASYNC_ACCESS_KEY", requires = "secret")]
    pub key: Option<String>,

    /// Secret key for the object store
    #[arg(long, env = "METASYNC_SECRET_KEY", requires = "key", hide_env_values = true)]
    pub secret: Option<String>,

    /// Object store region
    #[arg(long, env = "METASYNC_REGION")]
    pub region: Option<String>,

    /// Keep empty directories in a local destination
    #[arg(long)]
    pub no_prune: bool,

    /// Use a local destination's stored manifest instead of re-hashing it
    #[arg(long)]
    pub trust_local_manifest: bool,

    /// Print what would change without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Object-store credentials given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: String,
    pub region: Option<String>,
}

fn parse_manifest_name(name: &str) -> Result<String, String> {
    metasync::core::validate_manifest_name(name)
        .map(|()| name.to_string())
        .map_err(|e| e.to_string())
}

impl Cli {
    /// Credentials, when both halves of the key pair were given.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.key, &self.secret) {
            (Some(key), Some(secret)) => Some(Credentials {
                key: key.clone(),
                secret: secret.clone(),
                region: self.region.clone(),
            }),
            _ => None,
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_manifest_name(self.manifest_name.clone())
            .with_max_concurrent_transfers(self.concurrency)
            .with_prune_empty_dirs(!self.no_prune)
            .with_trust_local_manifest(self.trust_local_manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags_into_config() {
        let cli = Cli::parse_from([
            "metasync",
            "--concurrency",
            "0",
            "--no-prune",
            "--manifest-name",
            ".state",
            "src",
            "bucket:dst",
        ]);

        let config = cli.sync_config();
        assert_eq!(config.max_concurrent_transfers, 1);
        assert!(!config.prune_empty_dirs);
        assert_eq!(config.manifest_name, ".state");
        assert_eq!(cli.source, "src");
        assert_eq!(cli.destination, "bucket:dst");
    }

    #[test]
    fn rejects_nested_manifest_name() {
        let result =
            Cli::try_parse_from(["metasync", "--manifest-name", "state/slot", "a", "b:c"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_credentials() {
        let cli = Cli::parse_from([
            "metasync", "--key", "k", "--secret", "s", "--region", "eu", "a", "b:c",
        ]);
        assert_eq!(
            cli.credentials(),
            Some(Credentials {
                key: "k".into(),
                secret: "s".into(),
                region: Some("eu".into()),
            })
        );

        assert!(Cli::try_parse_from(["metasync", "--key", "k", "a", "b:c"]).is_err());
    }

    #[test]
    fn requires_both_endpoints() {
        assert!(Cli::try_parse_from(["metasync", "only-one"]).is_err());
    }
}
