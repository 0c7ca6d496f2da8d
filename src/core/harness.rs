use crate::adapters::{ApiGatewayLookup, HickoryDnsProbe, ReqwestProbe, TokioCommandRunner};
use crate::config::HarnessConfig;
use crate::core::propagation::PropagationPolicy;
use crate::core::{
    BasePathMapping, CommandRunner, CommandSpec, DnsProbe, DomainLookup, DomainReport, HttpProbe,
    Result,
};
use crate::utils::validation::{normalize_url, validate_folder_name, validate_url};
use std::path::PathBuf;

pub const RANDOM_STRING_ENV: &str = "RANDOM_STRING";

/// Harness wired to the real shell, HTTP, DNS and API Gateway.
pub type LiveHarness =
    DomainHarness<TokioCommandRunner, ReqwestProbe, HickoryDnsProbe, ApiGatewayLookup>;

/// Test scaffolding around the `sls` CLI, DNS and API Gateway.
///
/// Every operation swallows failures: errors are logged and reported as `false` or `None`.
pub struct DomainHarness<R, H, D, L> {
    runner: R,
    http: H,
    dns: D,
    lookup: L,
    program: String,
    tests_root: PathBuf,
    policy: PropagationPolicy,
}

impl LiveHarness {
    pub async fn from_config(config: &HarnessConfig) -> Result<Self> {
        let runner = TokioCommandRunner::new(config.command_timeout());
        let http = ReqwestProbe::new(config.http_timeout())?;
        let dns = HickoryDnsProbe::from_system_conf_or_default();
        let lookup = ApiGatewayLookup::from_settings(&config.aws).await;

        Ok(Self::new(runner, http, dns, lookup, config))
    }
}

impl<R, H, D, L> DomainHarness<R, H, D, L>
where
    R: CommandRunner,
    H: HttpProbe,
    D: DnsProbe,
    L: DomainLookup,
{
    pub fn new(runner: R, http: H, dns: D, lookup: L, config: &HarnessConfig) -> Self {
        Self {
            runner,
            http,
            dns,
            lookup,
            program: config.shell.program.clone(),
            tests_root: config.tests_root(),
            policy: config.propagation_policy(),
        }
    }

    /// `true` only when the command ran, exited zero and wrote nothing to stderr.
    pub async fn exec(&self, command: &CommandSpec) -> bool {
        match self.runner.run(command).await {
            Ok(output) if output.is_clean() => true,
            Ok(output) => {
                tracing::warn!(
                    "`{}` failed (exit code {:?}): {}",
                    command,
                    output.code,
                    output.stderr.trim()
                );
                false
            }
            Err(e) => {
                tracing::warn!("`{}` could not be run: {}", command, e);
                false
            }
        }
    }

    /// Status code of a GET to `url`; bare domains are requested over https.
    pub async fn curl_url(&self, url: &str) -> Option<u16> {
        let url = normalize_url(url);
        if let Err(e) = validate_url("url", &url) {
            tracing::debug!("Not requesting {}: {}", url, e);
            return None;
        }
        match self.http.status(&url).await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!("GET {} rejected: {}", url, e);
                None
            }
        }
    }

    pub async fn get_endpoint_type(&self, domain: &str) -> Option<String> {
        match self.lookup.endpoint_types(domain).await {
            Ok(types) => types.into_iter().next(),
            Err(e) => {
                tracing::debug!("No endpoint type for {}: {}", domain, e);
                None
            }
        }
    }

    pub async fn get_stage(&self, domain: &str) -> Option<String> {
        self.first_mapping(domain).await.and_then(|m| m.stage)
    }

    pub async fn get_base_path(&self, domain: &str) -> Option<String> {
        self.first_mapping(domain).await.and_then(|m| m.base_path)
    }

    async fn first_mapping(&self, domain: &str) -> Option<BasePathMapping> {
        match self.lookup.base_path_mappings(domain).await {
            Ok(mappings) => mappings.into_iter().next(),
            Err(e) => {
                tracing::debug!("No base path mappings for {}: {}", domain, e);
                None
            }
        }
    }

    fn stack_command(&self, folder: &str, random_string: &str, subcommand: &str) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg(subcommand)
            .current_dir(self.tests_root.join(folder))
            .env(RANDOM_STRING_ENV, random_string)
    }

    /// `sls create_domain` then `sls deploy` in the test folder; stops at the first failure.
    pub async fn deploy_lambdas(&self, folder: &str, random_string: &str) -> bool {
        if let Err(e) = validate_folder_name("folder", folder) {
            tracing::warn!("Refusing to deploy: {}", e);
            return false;
        }

        for subcommand in ["create_domain", "deploy"] {
            let command = self.stack_command(folder, random_string, subcommand);
            if !self.exec(&command).await {
                return false;
            }
        }
        true
    }

    /// `sls delete_domain` then `sls remove`. Both run even if the first fails so
    /// that a half-created stack is still torn down.
    pub async fn remove_lambdas(&self, folder: &str, random_string: &str) -> bool {
        if let Err(e) = validate_folder_name("folder", folder) {
            tracing::warn!("Refusing to remove: {}", e);
            return false;
        }

        let domain_deleted = self
            .exec(&self.stack_command(folder, random_string, "delete_domain"))
            .await;
        let stack_removed = self
            .exec(&self.stack_command(folder, random_string, "remove"))
            .await;
        domain_deleted && stack_removed
    }

    pub async fn dns_lookup(&self, domain: &str) -> bool {
        match self.dns.resolves(domain).await {
            Ok(resolves) => resolves,
            Err(e) => {
                tracing::debug!("DNS lookup for {} failed: {}", domain, e);
                false
            }
        }
    }

    /// Polls `dns_lookup` until the domain resolves or the retry ceiling is hit.
    /// Never checks when `enabled` is false.
    pub async fn dns_propagation(&self, domain: &str, enabled: bool) -> bool {
        if !enabled {
            return false;
        }

        let propagated = self
            .policy
            .wait_for(|attempt| async move {
                tracing::info!(
                    "Checking DNS for {} (attempt {}/{})",
                    domain,
                    attempt,
                    self.policy.max_attempts
                );
                self.dns_lookup(domain).await
            })
            .await;

        if !propagated {
            tracing::warn!(
                "{} did not resolve after {} attempts ({:?} of waiting)",
                domain,
                self.policy.max_attempts,
                self.policy.ceiling()
            );
        }
        propagated
    }

    /// Deploys the stack and, when `enabled`, waits for the domain to resolve.
    /// A disabled domain has nothing to propagate, so only the deploy counts.
    pub async fn create_resources(
        &self,
        folder: &str,
        domain: &str,
        random_string: &str,
        enabled: bool,
    ) -> bool {
        tracing::info!("Creating resources for {}", domain);

        if !self.deploy_lambdas(folder, random_string).await {
            tracing::warn!("Deploy of {} failed", folder);
            return false;
        }
        tracing::info!("Deployed {}", folder);

        if !enabled {
            tracing::info!("Domain disabled, skipping DNS check for {}", domain);
            return true;
        }

        let verified = self.dns_propagation(domain, enabled).await;
        if verified {
            tracing::info!("Domain {} resolves", domain);
        }
        verified
    }

    pub async fn destroy_resources(&self, folder: &str, domain: &str, random_string: &str) -> bool {
        tracing::info!("Destroying resources for {}", domain);

        let removed = self.remove_lambdas(folder, random_string).await;
        if removed {
            tracing::info!("Removed {}", folder);
        } else {
            tracing::warn!("Teardown of {} did not finish cleanly", folder);
        }
        removed
    }

    pub async fn inspect(&self, domain: &str) -> DomainReport {
        let mapping = self.first_mapping(domain).await.unwrap_or_default();

        DomainReport {
            domain: domain.to_string(),
            http_status: self.curl_url(domain).await,
            endpoint_type: self.get_endpoint_type(domain).await,
            stage: mapping.stage,
            base_path: mapping.base_path,
            resolves: self.dns_lookup(domain).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CommandOutput;
    use crate::utils::error::HarnessError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn clean_output() -> CommandOutput {
        CommandOutput {
            success: true,
            code: Some(0),
            stdout: "Service deployed\n".to_string(),
            stderr: String::new(),
        }
    }

    fn failed_output(stderr: &str) -> CommandOutput {
        CommandOutput {
            success: false,
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn unreachable_error() -> HarnessError {
        HarnessError::IoError(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))
    }

    #[derive(Clone, Default)]
    struct MockRunner {
        calls: Arc<Mutex<Vec<CommandSpec>>>,
        responses: Arc<Mutex<VecDeque<Result<CommandOutput>>>>,
    }

    impl MockRunner {
        fn with_responses(responses: Vec<Result<CommandOutput>>) -> Self {
            Self {
                calls: Arc::default(),
                responses: Arc::new(Mutex::new(responses.into())),
            }
        }

        async fn subcommands(&self) -> Vec<String> {
            self.calls
                .lock()
                .await
                .iter()
                .map(|c| c.args.join(" "))
                .collect()
        }
    }

    #[async_trait]
    impl CommandRunner for MockRunner {
        async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
            self.calls.lock().await.push(command.clone());
            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Ok(clean_output()))
        }
    }

    #[derive(Clone, Default)]
    struct MockHttp {
        status: Option<u16>,
        requested: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl HttpProbe for MockHttp {
        async fn status(&self, url: &str) -> Result<u16> {
            self.requested.lock().await.push(url.to_string());
            self.status.ok_or_else(unreachable_error)
        }
    }

    /// Answers from the queue, then `false` once it runs dry.
    #[derive(Clone, Default)]
    struct MockDns {
        answers: Arc<Mutex<VecDeque<Result<bool>>>>,
        lookups: Arc<Mutex<u32>>,
    }

    impl MockDns {
        fn with_answers(answers: Vec<Result<bool>>) -> Self {
            Self {
                answers: Arc::new(Mutex::new(answers.into())),
                lookups: Arc::default(),
            }
        }

        async fn lookups(&self) -> u32 {
            *self.lookups.lock().await
        }
    }

    #[async_trait]
    impl DnsProbe for MockDns {
        async fn resolves(&self, _host: &str) -> Result<bool> {
            *self.lookups.lock().await += 1;
            self.answers.lock().await.pop_front().unwrap_or(Ok(false))
        }
    }

    /// `None` simulates an API error such as NotFoundException.
    #[derive(Clone, Default)]
    struct MockLookup {
        types: Option<Vec<String>>,
        mappings: Option<Vec<BasePathMapping>>,
    }

    #[async_trait]
    impl DomainLookup for MockLookup {
        async fn endpoint_types(&self, _domain: &str) -> Result<Vec<String>> {
            self.types
                .clone()
                .ok_or_else(|| HarnessError::aws("GetDomainName", "NotFoundException"))
        }

        async fn base_path_mappings(&self, _domain: &str) -> Result<Vec<BasePathMapping>> {
            self.mappings
                .clone()
                .ok_or_else(|| HarnessError::aws("GetBasePathMappings", "NotFoundException"))
        }
    }

    type TestHarness = DomainHarness<MockRunner, MockHttp, MockDns, MockLookup>;

    fn build_harness(
        runner: MockRunner,
        http: MockHttp,
        dns: MockDns,
        lookup: MockLookup,
    ) -> TestHarness {
        let mut config = HarnessConfig::default();
        config.dns.retry_interval_seconds = 60;
        config.dns.max_retries = 40;
        DomainHarness::new(runner, http, dns, lookup, &config)
    }

    fn with_runner(runner: MockRunner) -> TestHarness {
        build_harness(
            runner,
            MockHttp::default(),
            MockDns::default(),
            MockLookup::default(),
        )
    }

    #[tokio::test]
    async fn test_exec_reports_success() {
        let harness = with_runner(MockRunner::default());
        assert!(harness.exec(&CommandSpec::new("true")).await);
    }

    #[tokio::test]
    async fn test_exec_false_on_non_zero_exit() {
        let runner = MockRunner::with_responses(vec![Ok(failed_output(""))]);
        let harness = with_runner(runner);
        assert!(!harness.exec(&CommandSpec::new("false")).await);
    }

    #[tokio::test]
    async fn test_exec_false_on_stderr_output() {
        let mut output = clean_output();
        output.stderr = "Warning: deprecated option\n".to_string();
        let harness = with_runner(MockRunner::with_responses(vec![Ok(output)]));

        assert!(!harness.exec(&CommandSpec::new("sls")).await);
    }

    #[tokio::test]
    async fn test_exec_false_when_command_cannot_run() {
        let runner = MockRunner::with_responses(vec![Err(HarnessError::CommandTimeout {
            command: "sls deploy".to_string(),
            seconds: 1,
        })]);
        let harness = with_runner(runner);
        assert!(!harness.exec(&CommandSpec::new("sls")).await);
    }

    #[tokio::test]
    async fn test_curl_url_returns_status() {
        let http = MockHttp {
            status: Some(200),
            ..Default::default()
        };
        let harness = build_harness(
            MockRunner::default(),
            http.clone(),
            MockDns::default(),
            MockLookup::default(),
        );

        assert_eq!(harness.curl_url("api.example.com").await, Some(200));
        assert_eq!(
            http.requested.lock().await.as_slice(),
            ["https://api.example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_curl_url_skips_malformed_urls() {
        let http = MockHttp {
            status: Some(200),
            ..Default::default()
        };
        let harness = build_harness(
            MockRunner::default(),
            http.clone(),
            MockDns::default(),
            MockLookup::default(),
        );

        assert_eq!(harness.curl_url("ftp://files.example.com").await, None);
        assert_eq!(harness.curl_url("").await, None);
        assert!(http.requested.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_curl_url_none_when_rejected() {
        let harness = with_runner(MockRunner::default());
        assert_eq!(harness.curl_url("https://api.example.com/test").await, None);
    }

    #[tokio::test]
    async fn test_lookups_return_first_entry() {
        let lookup = MockLookup {
            types: Some(vec!["EDGE".to_string(), "REGIONAL".to_string()]),
            mappings: Some(vec![
                BasePathMapping {
                    base_path: Some("api".to_string()),
                    stage: Some("test".to_string()),
                    rest_api_id: Some("a1b2c3".to_string()),
                },
                BasePathMapping {
                    base_path: Some("v2".to_string()),
                    stage: Some("prod".to_string()),
                    rest_api_id: None,
                },
            ]),
        };
        let harness = build_harness(
            MockRunner::default(),
            MockHttp::default(),
            MockDns::default(),
            lookup,
        );

        assert_eq!(harness.get_endpoint_type("d").await.as_deref(), Some("EDGE"));
        assert_eq!(harness.get_stage("d").await.as_deref(), Some("test"));
        assert_eq!(harness.get_base_path("d").await.as_deref(), Some("api"));
    }

    #[tokio::test]
    async fn test_lookups_none_on_api_error_or_empty() {
        let harness = with_runner(MockRunner::default());
        assert_eq!(harness.get_endpoint_type("missing.example.com").await, None);
        assert_eq!(harness.get_stage("missing.example.com").await, None);
        assert_eq!(harness.get_base_path("missing.example.com").await, None);

        let empty = MockLookup {
            types: Some(vec![]),
            mappings: Some(vec![]),
        };
        let harness = build_harness(
            MockRunner::default(),
            MockHttp::default(),
            MockDns::default(),
            empty,
        );
        assert_eq!(harness.get_endpoint_type("d").await, None);
        assert_eq!(harness.get_stage("d").await, None);
    }

    #[tokio::test]
    async fn test_deploy_runs_create_domain_then_deploy() {
        let runner = MockRunner::default();
        let harness = with_runner(runner.clone());

        assert!(harness.deploy_lambdas("basic-example", "abc123").await);

        let calls = runner.calls.lock().await.clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "sls");
        assert_eq!(calls[0].args, vec!["create_domain"]);
        assert_eq!(calls[1].args, vec!["deploy"]);
        for call in &calls {
            assert_eq!(
                call.current_dir.as_deref(),
                Some(Path::new("test/integration-tests/basic-example"))
            );
            assert_eq!(call.envs.get(RANDOM_STRING_ENV).map(String::as_str), Some("abc123"));
        }
    }

    #[tokio::test]
    async fn test_deploy_stops_after_failed_create_domain() {
        let runner = MockRunner::with_responses(vec![Ok(failed_output("Error: no certificate"))]);
        let harness = with_runner(runner.clone());

        assert!(!harness.deploy_lambdas("basic-example", "abc123").await);
        assert_eq!(runner.subcommands().await, vec!["create_domain"]);
    }

    #[tokio::test]
    async fn test_deploy_rejects_path_folder() {
        let runner = MockRunner::default();
        let harness = with_runner(runner.clone());

        assert!(!harness.deploy_lambdas("../outside", "abc123").await);
        assert!(runner.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_remove_runs_both_steps_even_after_failure() {
        let runner = MockRunner::with_responses(vec![Ok(failed_output("domain not found"))]);
        let harness = with_runner(runner.clone());

        assert!(!harness.remove_lambdas("basic-example", "abc123").await);
        assert_eq!(runner.subcommands().await, vec!["delete_domain", "remove"]);
    }

    #[tokio::test]
    async fn test_dns_lookup_maps_errors_to_false() {
        let dns = MockDns::with_answers(vec![Ok(true), Err(unreachable_error())]);
        let harness = build_harness(
            MockRunner::default(),
            MockHttp::default(),
            dns,
            MockLookup::default(),
        );

        assert!(harness.dns_lookup("api.example.com").await);
        assert!(!harness.dns_lookup("api.example.com").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dns_propagation_retries_until_resolved() {
        let dns = MockDns::with_answers(vec![Ok(false), Err(unreachable_error()), Ok(true)]);
        let harness = build_harness(
            MockRunner::default(),
            MockHttp::default(),
            dns.clone(),
            MockLookup::default(),
        );
        let start = tokio::time::Instant::now();

        assert!(harness.dns_propagation("api.example.com", true).await);
        assert_eq!(dns.lookups().await, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dns_propagation_gives_up_after_40_attempts() {
        let dns = MockDns::default();
        let harness = build_harness(
            MockRunner::default(),
            MockHttp::default(),
            dns.clone(),
            MockLookup::default(),
        );
        let start = tokio::time::Instant::now();

        assert!(!harness.dns_propagation("never.example.com", true).await);
        assert_eq!(dns.lookups().await, 40);
        assert_eq!(start.elapsed(), PropagationPolicy::default().ceiling());
    }

    #[tokio::test]
    async fn test_dns_propagation_disabled_never_looks_up() {
        let dns = MockDns::with_answers(vec![Ok(true)]);
        let harness = build_harness(
            MockRunner::default(),
            MockHttp::default(),
            dns.clone(),
            MockLookup::default(),
        );

        assert!(!harness.dns_propagation("api.example.com", false).await);
        assert_eq!(dns.lookups().await, 0);
    }

    #[tokio::test]
    async fn test_create_resources_deploys_and_waits_for_dns() {
        let runner = MockRunner::default();
        let dns = MockDns::with_answers(vec![Ok(true)]);
        let harness = build_harness(
            runner.clone(),
            MockHttp::default(),
            dns.clone(),
            MockLookup::default(),
        );

        assert!(
            harness
                .create_resources("basic-example", "abc-basic.example.com", "abc", true)
                .await
        );
        assert_eq!(runner.subcommands().await, vec!["create_domain", "deploy"]);
        assert_eq!(dns.lookups().await, 1);
    }

    #[tokio::test]
    async fn test_create_resources_skips_dns_when_disabled() {
        let dns = MockDns::default();
        let harness = build_harness(
            MockRunner::default(),
            MockHttp::default(),
            dns.clone(),
            MockLookup::default(),
        );

        assert!(
            harness
                .create_resources("disabled-domain", "abc-disabled.example.com", "abc", false)
                .await
        );
        assert_eq!(dns.lookups().await, 0);
    }

    #[tokio::test]
    async fn test_create_resources_false_when_deploy_fails() {
        let runner = MockRunner::with_responses(vec![Ok(clean_output()), Ok(failed_output("boom"))]);
        let dns = MockDns::with_answers(vec![Ok(true)]);
        let harness = build_harness(
            runner,
            MockHttp::default(),
            dns.clone(),
            MockLookup::default(),
        );

        assert!(
            !harness
                .create_resources("basic-example", "abc-basic.example.com", "abc", true)
                .await
        );
        assert_eq!(dns.lookups().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_resources_false_when_dns_never_resolves() {
        let harness = with_runner(MockRunner::default());
        assert!(
            !harness
                .create_resources("basic-example", "abc-basic.example.com", "abc", true)
                .await
        );
    }

    #[tokio::test]
    async fn test_destroy_resources() {
        let runner = MockRunner::default();
        let harness = with_runner(runner.clone());

        assert!(
            harness
                .destroy_resources("basic-example", "abc-basic.example.com", "abc")
                .await
        );
        assert_eq!(runner.subcommands().await, vec!["delete_domain", "remove"]);
    }

    #[tokio::test]
    async fn test_inspect_collects_everything() {
        let http = MockHttp {
            status: Some(403),
            ..Default::default()
        };
        let lookup = MockLookup {
            types: Some(vec!["REGIONAL".to_string()]),
            mappings: Some(vec![BasePathMapping {
                base_path: Some("(none)".to_string()),
                stage: Some("dev".to_string()),
                rest_api_id: None,
            }]),
        };
        let dns = MockDns::with_answers(vec![Ok(true)]);
        let harness = build_harness(MockRunner::default(), http, dns, lookup);

        let report = harness.inspect("api.example.com").await;
        assert_eq!(
            report,
            DomainReport {
                domain: "api.example.com".to_string(),
                http_status: Some(403),
                endpoint_type: Some("REGIONAL".to_string()),
                stage: Some("dev".to_string()),
                base_path: Some("(none)".to_string()),
                resolves: true,
            }
        );
    }
}
