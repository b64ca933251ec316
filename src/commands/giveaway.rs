use crate::giveaway::{self, Acknowledgment, ActorId, Giveaway, GiveawayRegistry, Resolution, SharedGiveaway};
use crate::types::{Context, GIVEAWAY_COLOR};
use anyhow::Error;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

fn entry_row(id: u64, label: String, disabled: bool) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(giveaway::custom_id(id))
        .label(label)
        .style(serenity::ButtonStyle::Success)
        .disabled(disabled)])
}

/// Start a giveaway with duration, prize, and number of winners.
#[poise::command(slash_command, check = "crate::checks::check_is_administrator", category = "Giveaways")]
pub async fn giveaway(
    ctx: Context<'_>,
    #[description = "Giveaway duration in seconds"] duration: i64,
    #[description = "The prize to win"] prize: String,
    #[description = "Number of winners"] winners: i64,
) -> Result<(), Error> {
    let host_name = match ctx.author_member().await {
        Some(member) => member.display_name().to_owned(),
        None => ctx.author().display_name().to_owned(),
    };

    let state = match Giveaway::new(ctx.author().id.into(), host_name, prize, duration, winners) {
        Ok(state) => state,
        Err(e) => {
            ctx.send(poise::CreateReply::default().content(e.to_string()).ephemeral(true)).await?;
            return Ok(());
        }
    };

    let embed = serenity::CreateEmbed::new()
        .title("🎉 **GIVEAWAY TIME!** 🎉")
        .description(state.description())
        .color(GIVEAWAY_COLOR)
        .footer(serenity::CreateEmbedFooter::new(state.footer()));
    let id = ctx.id();
    let reply = poise::CreateReply::default().embed(embed).components(vec![entry_row(id, state.entry_label(), false)]);

    // Registered before publishing so that the very first button press finds it.
    let registry = Arc::clone(&ctx.data().giveaways);
    let shared = registry.insert(id, state);

    let announcement = match ctx.send(reply).await {
        Ok(handle) => handle.message().await.map(|message| (message.channel_id, message.id)),
        Err(e) => Err(e),
    };
    let (channel_id, message_id) = match announcement {
        Ok(announcement) => announcement,
        Err(e) => {
            registry.remove(id);
            return Err(e.into());
        }
    };

    info!("{} started giveaway {id} in channel {channel_id}", ctx.author().name);
    schedule_resolution(Arc::clone(&ctx.serenity_context().http), registry, id, shared, channel_id, message_id);

    Ok(())
}

/// Resolves the giveaway once its duration has elapsed.
///
/// The returned handle completes after the results were announced, or the
/// announcement failed and was logged.
pub fn schedule_resolution(
    http: Arc<serenity::Http>,
    registry: Arc<GiveawayRegistry>,
    id: u64,
    giveaway: SharedGiveaway,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> JoinHandle<()> {
    let duration = giveaway::lock(&giveaway).duration();

    tokio::spawn(async move {
        tokio::time::sleep(duration).await;

        let Some((resolution, prize, label)) = close(&registry, id, &giveaway) else {
            return;
        };
        if let Err(e) = announce(&http, id, &resolution, &prize, label, channel_id, message_id).await {
            error!("Failed to announce the results of giveaway {id}: {e:?}");
        }
    })
}

fn close(registry: &GiveawayRegistry, id: u64, giveaway: &SharedGiveaway) -> Option<(Resolution, String, String)> {
    let mut giveaway = giveaway::lock(giveaway);
    let resolution = giveaway.resolve(&mut rand::rng());
    registry.remove(id);

    let resolution = resolution?;
    info!(
        "Giveaway {id} hosted by {} closed with {} participants and {} winners",
        giveaway.host().mention(),
        giveaway.participant_count(),
        resolution.winners().len()
    );
    Some((resolution, giveaway.prize().to_owned(), giveaway.entry_label()))
}

async fn announce(
    http: &serenity::Http,
    id: u64,
    resolution: &Resolution,
    prize: &str,
    label: String,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> Result<(), Error> {
    let edit = serenity::EditMessage::new().components(vec![entry_row(id, label, true)]);
    let reply_to = match channel_id.edit_message(http, message_id, edit).await {
        Ok(_) => Some((channel_id, message_id)),
        Err(e) => {
            // Replying to a deleted announcement would fail the whole message.
            warn!("Failed to disable the entry button of giveaway {id}: {e}");
            None
        }
    };

    channel_id.send_message(http, results_message(resolution, prize, reply_to)).await?;

    Ok(())
}

/// The results post, replying to the announcement when there is one. Only the
/// winners are pinged, never the host behind the replied-to message.
fn results_message(
    resolution: &Resolution,
    prize: &str,
    reply_to: Option<(serenity::ChannelId, serenity::MessageId)>,
) -> serenity::CreateMessage {
    let winners = resolution.winners().iter().copied().map(serenity::UserId::from);
    let mut message = serenity::CreateMessage::new()
        .content(resolution.announcement(prize))
        .allowed_mentions(serenity::CreateAllowedMentions::new().users(winners).replied_user(false));

    if let Some(reference) = reply_to {
        message = message.reference_message(serenity::MessageReference::from(reference));
    }

    message
}

/// Handles a press of a giveaway entry button. Other components are ignored.
pub async fn handle_entry(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    registry: &GiveawayRegistry,
) -> Result<(), Error> {
    let Some(id) = giveaway::parse_custom_id(&component.data.custom_id) else {
        return Ok(());
    };

    let (acknowledgment, label) = registry.enter(id, ActorId::from(component.user.id));

    if let (Acknowledgment::Entered { participants }, Some(label)) = (acknowledgment, label) {
        debug!("{} entered giveaway {id}, {participants} participants", component.user.name);
        // Sent after the lock is released, so racing presses may briefly show a stale count.
        let update = serenity::CreateInteractionResponseMessage::new().components(vec![entry_row(id, label, false)]);
        component.create_response(ctx, serenity::CreateInteractionResponse::UpdateMessage(update)).await?;

        let followup =
            serenity::CreateInteractionResponseFollowup::new().content(acknowledgment.message()).ephemeral(true);
        component.create_followup(ctx, followup).await?;
    } else {
        debug!("{} pressed the button of giveaway {id}: {acknowledgment:?}", component.user.name);
        let response =
            serenity::CreateInteractionResponseMessage::new().content(acknowledgment.message()).ephemeral(true);
        component.create_response(ctx, serenity::CreateInteractionResponse::Message(response)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_with_giveaway(id: u64) -> (GiveawayRegistry, SharedGiveaway) {
        let registry = GiveawayRegistry::default();
        let state = Giveaway::new(ActorId::new(1), "host", "p", 0, 1).unwrap();
        let shared = registry.insert(id, state);
        (registry, shared)
    }

    #[test]
    fn close_resolves_once_and_unregisters() {
        let (registry, shared) = registry_with_giveaway(7);
        registry.enter(7, ActorId::new(5));

        let (resolution, prize, label) = close(&registry, 7, &shared).unwrap();
        assert_eq!(resolution, Resolution::Winners(vec![ActorId::new(5)]));
        assert_eq!(prize, "p");
        assert_eq!(label, "🎉(1) ended");
        assert!(registry.get(7).is_none());

        assert!(close(&registry, 7, &shared).is_none());
        assert_eq!(registry.enter(7, ActorId::new(6)), (Acknowledgment::Ended, None));
        assert_eq!(giveaway::lock(&shared).participant_count(), 1);
    }

    #[test]
    fn close_without_entrants_announces_nobody() {
        let (registry, shared) = registry_with_giveaway(8);

        let (resolution, _, label) = close(&registry, 8, &shared).unwrap();
        assert_eq!(resolution, Resolution::NoParticipants);
        assert_eq!(label, "🎉(0) ended");
        assert!(registry.get(8).is_none());
    }

    #[test]
    fn results_reply_to_the_announcement_and_ping_only_winners() {
        let resolution = Resolution::Winners(vec![ActorId::new(5), ActorId::new(9)]);
        let channel_id = serenity::ChannelId::new(100);
        let message_id = serenity::MessageId::new(200);

        let message = results_message(&resolution, "Nitro", Some((channel_id, message_id)));
        let message = serde_json::to_value(message).unwrap();

        assert_eq!(message["content"], json!("🎉 Congratulations <@5>, <@9>! You won the **Nitro**!"));
        assert_eq!(message["message_reference"]["message_id"], serde_json::to_value(message_id).unwrap());
        assert_eq!(
            message["allowed_mentions"]["users"],
            json!([
                serde_json::to_value(serenity::UserId::new(5)).unwrap(),
                serde_json::to_value(serenity::UserId::new(9)).unwrap(),
            ])
        );
        assert_eq!(message["allowed_mentions"]["replied_user"], json!(false));
    }

    #[test]
    fn results_without_announcement_are_a_plain_message() {
        let message = serde_json::to_value(results_message(&Resolution::NoParticipants, "Nitro", None)).unwrap();

        assert_eq!(message["content"], json!("No one participated in the giveaway."));
        assert!(message.get("message_reference").map_or(true, serde_json::Value::is_null));
    }
}
