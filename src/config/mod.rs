pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "netns-attrs")]
#[command(about = "Per-namespace attribute tree driven by namespace lifecycle hooks")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Namespaces to create, in order
    #[arg(long, value_delimiter = ',', default_value = "init_net")]
    pub namespaces: Vec<String>,

    /// Attribute writes as NAMESPACE=TEXT, applied as that namespace's owner
    #[arg(long = "set")]
    pub writes: Vec<String>,

    /// Print each namespace's view as JSON
    #[arg(long)]
    pub json: bool,

    /// Simulate a failing hook registration
    #[arg(long)]
    pub fail_registration: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Splits `--set` arguments into (namespace, text) pairs.
    pub fn parsed_writes(&self) -> crate::utils::error::Result<Vec<(String, String)>> {
        self.writes
            .iter()
            .map(|raw| match raw.split_once('=') {
                Some((ns, text)) if !ns.is_empty() => Ok((ns.to_string(), text.to_string())),
                _ => Err(crate::utils::error::NetnsError::InvalidConfigValueError {
                    field: "set".to_string(),
                    value: raw.clone(),
                    reason: "expected NAMESPACE=TEXT".to_string(),
                }),
            })
            .collect()
    }
}
