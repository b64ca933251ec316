use crate::config::Config;
use crate::giveaway::GiveawayRegistry;
use anyhow::Error;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

#[derive(Debug)]
pub struct Data {
    pub discord_guild_id: Option<serenity::GuildId>,
    pub giveaways: Arc<GiveawayRegistry>,
}

impl Data {
    pub fn new(config: &Config) -> Self {
        Self {
            discord_guild_id: config.discord.guild_id.map(serenity::GuildId::new),
            giveaways: Arc::new(GiveawayRegistry::default()),
        }
    }
}

pub type Context<'a> = poise::Context<'a, Data, Error>;

// Discord's "green" embed colour
pub const GIVEAWAY_COLOR: (u8, u8, u8) = (0x2e, 0xcc, 0x71);
