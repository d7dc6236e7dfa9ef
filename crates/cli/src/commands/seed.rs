use crate::commands::{load_config, runtime, CommandResult};
use peerpost_core::config::LoadOptions;
use peerpost_db::{connect_with_settings, migrations, DemoDataset, SeedResult, SqlPostArchive};

pub fn run(options: LoadOptions, reset: bool) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
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

        if reset {
            DemoDataset::clean(&pool)
                .await
                .map_err(|error| ("seed_reset", error.to_string(), 5u8))?;
        }

        let archive = SqlPostArchive::new(pool.clone());
        let seed_result = DemoDataset::load_into(&archive)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result = if verification.all_present {
            Ok(seed_result)
        } else {
            Err(("seed_verification", verification_failure_message(&verification.checks), 6u8))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", success_message(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn success_message(seeded: &SeedResult) -> String {
    format!(
        "demo dataset loaded into channel `{}` (team `{}`): {} users, {} posts, {} reactions",
        seeded.channel_id,
        seeded.team_id,
        seeded.users_seeded,
        seeded.posts_seeded,
        seeded.reactions_seeded
    )
}

fn verification_failure_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks = checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
