use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "domain-itest")]
#[command(about = "Deploy, probe and tear down custom-domain integration test stacks")]
pub struct CliArgs {
    #[arg(long, global = true, help = "TOML file with harness settings")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the domain, deploy the stack and wait for DNS
    Create(CreateArgs),
    /// Delete the domain and remove the stack
    Destroy(DestroyArgs),
    /// Print HTTP status, endpoint type, stage and base path of a domain
    Inspect(DomainArgs),
    /// Check whether a domain resolves
    Dns(DnsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    #[arg(long, help = "Test stack directory under the tests root")]
    pub folder: String,

    #[arg(long)]
    pub domain: String,

    #[arg(long, help = "Namespace token; generated when omitted")]
    pub random_string: Option<String>,

    #[arg(long, help = "Do not wait for the domain to resolve")]
    pub skip_dns: bool,
}

#[derive(Debug, Clone, Args)]
pub struct DestroyArgs {
    #[arg(long)]
    pub folder: String,

    #[arg(long)]
    pub domain: String,

    #[arg(long)]
    pub random_string: String,
}

#[derive(Debug, Clone, Args)]
pub struct DomainArgs {
    #[arg(long)]
    pub domain: String,
}

#[derive(Debug, Clone, Args)]
pub struct DnsArgs {
    #[arg(long)]
    pub domain: String,

    #[arg(long, help = "Poll until the domain resolves or retries run out")]
    pub wait: bool,
}
