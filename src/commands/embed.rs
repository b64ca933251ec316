use crate::types::Context;
use anyhow::Error;
use poise::serenity_prelude as serenity;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    /// Missing `#` or not seven characters long.
    #[error("Please provide a valid hex color code (e.g., #FF5733).")]
    Malformed,
    #[error("Invalid color format. Please use a valid hex color (e.g., #FF5733).")]
    InvalidHex,
}

/// Parses a `#RRGGBB` color code.
pub fn parse_hex_color(color: &str) -> Result<u32, ColorError> {
    let digits = color.strip_prefix('#').filter(|digits| digits.len() == 6).ok_or(ColorError::Malformed)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex);
    }

    u32::from_str_radix(digits, 16).map_err(|_| ColorError::InvalidHex)
}

#[must_use]
pub fn build_embed(
    title: String,
    description: String,
    color: u32,
    footer: Option<String>,
    image_url: Option<String>,
    thumbnail_url: Option<String>,
) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new().title(title).description(description).color(color);

    if let Some(footer) = footer.filter(|footer| !footer.is_empty()) {
        embed = embed.footer(serenity::CreateEmbedFooter::new(footer));
    }
    if let Some(thumbnail_url) = thumbnail_url.filter(|url| !url.is_empty()) {
        embed = embed.thumbnail(thumbnail_url);
    }
    if let Some(image_url) = image_url.filter(|url| !url.is_empty()) {
        embed = embed.image(image_url);
    }

    embed
}

/// Create an embed with a custom color, optional image, thumbnail, and footer.
#[poise::command(slash_command, check = "crate::checks::check_is_administrator", category = "Utilities")]
pub async fn embed(
    ctx: Context<'_>,
    #[description = "The title of the embed"] title: String,
    #[description = "The description of the embed"] description: String,
    #[description = "The color for the embed in hex format (e.g., #FF5733)"] color: String,
    #[description = "Optional footer text"] footer: Option<String>,
    #[description = "Optional image or GIF URL to add to the bottom of the embed"] image_url: Option<String>,
    #[description = "Optional URL for a small image (thumbnail) in the top-right corner"]
    thumbnail_url: Option<String>,
) -> Result<(), Error> {
    let color = match parse_hex_color(&color) {
        Ok(color) => color,
        Err(e) => {
            ctx.send(poise::CreateReply::default().content(e.to_string()).ephemeral(true)).await?;
            return Ok(());
        }
    };

    let embed = build_embed(title, description, color, footer, image_url, thumbnail_url);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
