use anyhow::Context;
use clap::Parser;
use domain_itest::config::cli::{CliArgs, Command};
use domain_itest::utils::{logger, validation::{self, Validate}};
use domain_itest::{random_string, HarnessConfig, HarnessError, LiveHarness};

fn load_config(args: &CliArgs) -> anyhow::Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

fn require_resolution(domain: &str, resolves: bool) -> anyhow::Result<()> {
    if !resolves {
        anyhow::bail!("{} does not resolve", domain);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let format = if args.json_logs {
        logger::LogFormat::Json
    } else {
        logger::LogFormat::Compact
    };
    logger::init_logger(format, args.verbose);

    let config = load_config(&args)?;
    tracing::debug!("Harness config: {:?}", config);

    let harness = LiveHarness::from_config(&config).await?;

    match args.command {
        Command::Create(create) => {
            validation::validate_domain_name("domain", &create.domain)?;
            let token = create.random_string.unwrap_or_else(random_string);

            if !harness
                .create_resources(&create.folder, &create.domain, &token, !create.skip_dns)
                .await
            {
                return Err(HarnessError::CreationError {
                    message: format!("{} ({}) was not created", create.domain, create.folder),
                }
                .into());
            }
            println!("✅ {} ready (RANDOM_STRING={})", create.domain, token);
        }
        Command::Destroy(destroy) => {
            if !harness
                .destroy_resources(&destroy.folder, &destroy.domain, &destroy.random_string)
                .await
            {
                anyhow::bail!("teardown of {} did not finish cleanly", destroy.folder);
            }
            println!("🧹 {} removed", destroy.domain);
        }
        Command::Inspect(target) => {
            validation::validate_domain_name("domain", &target.domain)?;
            let report = harness.inspect(&target.domain).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Dns(target) => {
            validation::validate_domain_name("domain", &target.domain)?;
            let resolves = if target.wait {
                harness.dns_propagation(&target.domain, true).await
            } else {
                harness.dns_lookup(&target.domain).await
            };
            println!("{} resolves: {}", target.domain, resolves);
            require_resolution(&target.domain, resolves)?;
        }
    }

    Ok(())
}
