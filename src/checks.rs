use crate::types::Context;
use poise::serenity_prelude as serenity;

const PERMISSION_DENIED: &str = "You do not have permission to use this command.";

/// Whether a member with the given resolved permissions may run privileged commands.
///
/// Outside of a guild there are no permissions to resolve, so nobody is privileged.
#[must_use]
pub fn is_privileged(permissions: Option<serenity::Permissions>) -> bool {
    permissions.is_some_and(serenity::Permissions::administrator)
}

pub async fn is_administrator(ctx: Context<'_>) -> bool {
    let permissions = ctx.author_member().await.and_then(|member| member.permissions);
    is_privileged(permissions)
}

pub async fn check_is_administrator(ctx: Context<'_>) -> anyhow::Result<bool> {
    let user_is_administrator = is_administrator(ctx).await;
    if !user_is_administrator {
        ctx.send(poise::CreateReply::default().content(PERMISSION_DENIED).ephemeral(true)).await?;
    }

    Ok(user_is_administrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_administrators_are_privileged() {
        assert!(is_privileged(Some(serenity::Permissions::ADMINISTRATOR)));
        assert!(is_privileged(Some(serenity::Permissions::ADMINISTRATOR | serenity::Permissions::SEND_MESSAGES)));
        assert!(!is_privileged(Some(serenity::Permissions::MANAGE_GUILD | serenity::Permissions::BAN_MEMBERS)));
        assert!(!is_privileged(Some(serenity::Permissions::empty())));
        assert!(!is_privileged(None));
    }
}
