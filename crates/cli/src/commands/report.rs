use std::sync::Arc;

use crate::commands::{load_config, runtime, CommandResult};
use peerpost_core::config::LoadOptions;
use peerpost_core::domain::channel::ChannelId;
use peerpost_core::report::date::DateResolver;
use peerpost_core::report::PeerReportService;
use peerpost_db::{connect_with_settings, migrations, SqlPostArchive};

/// Renders a report for `channel` from the local archive. `since` follows `/peer-report`.
pub fn run(options: LoadOptions, channel: &str, since: Option<&str>) -> CommandResult {
    let config = match load_config("report", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let resolver = DateResolver::new(config.report.utc_offset());
    let start = match resolver.resolve(since, resolver.today()) {
        Ok(start) => start,
        Err(error) => {
            return CommandResult::failure("report", "invalid_date", error.user_message(), 7);
        }
    };

    let runtime = match runtime("report") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let service = PeerReportService::new(Arc::new(SqlPostArchive::new(pool.clone())));
        let report = service
            .generate(&ChannelId(channel.to_owned()), start)
            .await
            .map_err(|error| ("aggregation", error.to_string(), 8u8));

        pool.close().await;
        report
    });

    match result {
        Ok(report) => CommandResult::success("report", report.text),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("report", error_class, message, exit_code)
        }
    }
}
