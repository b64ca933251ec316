#![warn(rust_2018_idioms, clippy::pedantic)]
#![allow(
	clippy::too_many_lines,
	clippy::missing_errors_doc,
	clippy::missing_panics_doc,
	clippy::module_name_repetitions,
)]

mod checks;
mod commands;
mod config;
mod giveaway;
mod types;

use anyhow::{Context as _, Error};
use config::Config;
use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use types::Data;

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::InteractionCreate { interaction } = event {
        if let Some(component) = interaction.as_message_component() {
            commands::giveaway::handle_entry(ctx, component, &data.giveaways).await?;
        }
    }

    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        // The check already told the user why.
        poise::FrameworkError::CommandCheckFailed { error: None, ctx, .. } => {
            debug!("{} was denied access to '{}'", ctx.author().name, ctx.command().qualified_name);
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            warn!("Failed to parse arguments of '{}': {:?}", ctx.command().qualified_name, error);
            let response = if let Some(multiline_help) = &ctx.command().help_text {
                format!("**{error}**\n{multiline_help}")
            } else {
                error.to_string()
            };

            if let Err(e) = ctx.send(poise::CreateReply::default().content(response).ephemeral(true)).await {
                warn!("{}", e);
            }
        }
        poise::FrameworkError::Command { ctx, error, .. } => {
            warn!("Command '{}' failed: {:?}", ctx.command().qualified_name, error);
            if let Err(e) = ctx.send(poise::CreateReply::default().content(error.to_string()).ephemeral(true)).await {
                warn!("{}", e);
            }
        }
        error => warn!("Encountered error: {:?}", error),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config_path = std::env::args().nth(1);
    let config = Config::load(config_path.as_deref())?;
    let token = config.token(std::env::var(config::TOKEN_VAR).ok())?;

    let framework = poise::Framework::builder()
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                let data = Data::new(&config);

                debug!("Registering commands...");
                match data.discord_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
                    }
                    None => poise::builtins::register_globally(ctx, &framework.options().commands).await?,
                }

                info!("giveaway bot logged in as {}", ready.user.name);
                Ok(data)
            })
        })
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::utilities::ping(),
                commands::embed::embed(),
                commands::giveaway::giveaway(),
            ],
            // The global error handler for all error cases that may occur
            on_error: |error| Box::pin(on_error(error)),
            // This code is run before every command
            pre_command: |ctx| {
                Box::pin(async move {
                    let channel_name = &ctx.channel_id().name(&ctx).await.unwrap_or_else(|_| "<unknown>".to_owned());
                    let author = &ctx.author().name;

                    info!("{} in {} used slash command '{}'", author, channel_name, &ctx.invoked_command_name());
                })
            },
            // This code is run after a command if it was successful (returned Ok)
            post_command: |ctx| {
                Box::pin(async move {
                    info!("Executed command {}!", ctx.command().qualified_name);
                })
            },
            // Enforce command checks even for owners
            skip_checks_for_owners: false,
            event_handler: |ctx, event, framework, data| Box::pin(event_handler(ctx, event, framework, data)),
            // Only the winners of a giveaway are ever pinged, and those messages set their own mentions
            allowed_mentions: Some(serenity::CreateAllowedMentions::new()),
            ..Default::default()
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("failed to create client")?;

    client.start().await.context("failed to run giveaway bot")
}
