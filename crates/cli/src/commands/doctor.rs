use peerpost_chat::MattermostClient;
use peerpost_core::config::{AppConfig, LoadOptions};
use peerpost_core::ports::TeamDirectory;
use peerpost_db::connect_with_settings;
use serde::Serialize;

const PLATFORM_CHECKS: [&str; 3] = ["database_connectivity", "mattermost_api", "recognition_channels"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Verdict {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct Finding {
    name: &'static str,
    status: Verdict,
    details: String,
}

impl Finding {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: Verdict::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: Verdict::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: Verdict::Skipped, details: format!("skipped: {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct Diagnosis {
    overall_status: Verdict,
    summary: String,
    checks: Vec<Finding>,
}

impl Diagnosis {
    fn from_findings(checks: Vec<Finding>) -> Self {
        let failed = checks.iter().filter(|check| check.status != Verdict::Pass).count();
        let (overall_status, summary) = if failed == 0 {
            (Verdict::Pass, "doctor: peerpost is ready".to_string())
        } else {
            (Verdict::Fail, format!("doctor: {failed} of {} checks did not pass", checks.len()))
        };
        Self { overall_status, summary, checks }
    }
}

pub fn run(options: LoadOptions, json_output: bool) -> String {
    let diagnosis = Diagnosis::from_findings(diagnose(options));

    if json_output {
        return serde_json::to_string_pretty(&diagnosis).unwrap_or_else(|error| {
            serde_json::json!({
                "overall_status": "fail",
                "summary": "doctor output could not be serialized",
                "error": error.to_string(),
            })
            .to_string()
        });
    }

    render_human(&diagnosis)
}

fn diagnose(options: LoadOptions) -> Vec<Finding> {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            let mut findings = vec![Finding::fail("config_validation", error.to_string())];
            findings.extend(
                PLATFORM_CHECKS.map(|name| Finding::skipped(name, "configuration did not load")),
            );
            return findings;
        }
    };

    let mut findings = vec![Finding::pass("config_validation", "configuration loaded and validated")];
    match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => findings.extend(runtime.block_on(check_platform(&config))),
        Err(error) => findings.extend(PLATFORM_CHECKS.map(|name| {
            Finding::fail(name, format!("async runtime unavailable: {error}"))
        })),
    }
    findings
}

async fn check_platform(config: &AppConfig) -> Vec<Finding> {
    let mut findings = vec![check_database(config).await];

    let client = match MattermostClient::from_config(&config.mattermost) {
        Ok(client) => client,
        Err(error) => {
            findings.push(Finding::fail("mattermost_api", error.to_string()));
            findings.push(Finding::skipped("recognition_channels", "no mattermost client"));
            return findings;
        }
    };

    match client.ping().await.and(client.me().await) {
        Ok(bot) => {
            findings.push(Finding::pass(
                "mattermost_api",
                format!("reached `{}` as @{}", client.site_url(), bot.username),
            ));
            findings.push(check_channels(&client, &config.channel.name).await);
        }
        Err(error) => {
            findings.push(Finding::fail("mattermost_api", error.to_string()));
            findings.push(Finding::skipped("recognition_channels", "mattermost unreachable"));
        }
    }
    findings
}

async fn check_database(config: &AppConfig) -> Finding {
    match connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    {
        Ok(pool) => {
            pool.close().await;
            Finding::pass("database_connectivity", format!("connected using `{}`", config.database.url))
        }
        Err(error) => {
            Finding::fail("database_connectivity", format!("failed to connect to database: {error}"))
        }
    }
}

/// Read-only: reports teams that still lack the channel instead of creating it.
async fn check_channels(teams: &dyn TeamDirectory, channel_name: &str) -> Finding {
    const NAME: &str = "recognition_channels";

    let joined = match teams.list_teams().await {
        Ok(joined) => joined,
        Err(error) => return Finding::fail(NAME, error.to_string()),
    };
    if joined.is_empty() {
        return Finding::fail(NAME, "the bot is not a member of any team");
    }

    let mut missing = Vec::new();
    for team in &joined {
        match teams.find_channel(&team.id, channel_name).await {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(team.name.clone()),
            Err(error) => return Finding::fail(NAME, error.to_string()),
        }
    }

    if missing.is_empty() {
        Finding::pass(NAME, format!("`{channel_name}` exists in {} team(s)", joined.len()))
    } else {
        Finding::fail(
            NAME,
            format!(
                "`{channel_name}` is missing in {}; start the server to provision it",
                missing.join(", ")
            ),
        )
    }
}

fn render_human(diagnosis: &Diagnosis) -> String {
    let mut lines = vec![diagnosis.summary.clone()];

    lines.extend(diagnosis.checks.iter().map(|check| {
        let marker = match check.status {
            Verdict::Pass => "ok",
            Verdict::Fail => "fail",
            Verdict::Skipped => "skip",
        };
        format!("- [{marker}] {}: {}", check.name, check.details)
    }));

    lines.join("\n")
}
