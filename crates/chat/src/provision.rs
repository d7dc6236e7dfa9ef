use peerpost_core::domain::channel::ChannelDirectory;
use peerpost_core::errors::CollaboratorError;
use peerpost_core::ports::{NewChannel, TeamDirectory};

/// Makes sure every team has an open recognition channel called `name`, creating missing ones,
/// and returns the resulting team-to-channel map.
pub async fn ensure_channels(
    teams: &dyn TeamDirectory,
    name: &str,
    display_name: &str,
) -> Result<ChannelDirectory, CollaboratorError> {
    let mut directory = ChannelDirectory::new();

    for team in teams.list_teams().await? {
        let channel = match teams.find_channel(&team.id, name).await? {
            Some(existing) => existing,
            None => {
                let created = teams
                    .create_channel(NewChannel {
                        team_id: team.id.clone(),
                        name: name.to_owned(),
                        display_name: display_name.to_owned(),
                    })
                    .await?;
                tracing::info!(
                    event_name = "provision.channel_created",
                    team_id = %team.id,
                    channel_id = %created.id,
                    channel = name,
                    "created recognition channel"
                );
                created
            }
        };
        directory.insert(team.id, channel.id);
    }

    tracing::info!(
        event_name = "provision.channels_ready",
        teams = directory.len(),
        "recognition channels resolved"
    );
    Ok(directory)
}
