use anyhow::{Context as _, Error};
use serde::Deserialize;

/// Environment variable holding the bot token. Takes precedence over the config file.
pub const TOKEN_VAR: &str = "TOKEN";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiscordConfig {
    pub token: Option<String>,
    /// Register commands in this guild only instead of globally.
    pub guild_id: Option<u64>,
}

impl Config {
    /// Reads the TOML config at `path`, or falls back to an empty config.
    pub fn load(path: Option<&str>) -> Result<Self, Error> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).with_context(|| format!("failed to read config file {path}"))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents).context("failed to deserialize config file")
    }

    /// Picks the token from `env_token` first, then the config file.
    pub fn token(&self, env_token: Option<String>) -> Result<String, Error> {
        env_token
            .or_else(|| self.discord.token.clone())
            .filter(|token| !token.trim().is_empty())
            .with_context(|| format!("missing bot token: set {TOKEN_VAR} or `discord.token` in the config file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config = Config::parse(
            r#"
            [discord]
            token = "abc"
            guild_id = 273534239310479360
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.token.as_deref(), Some("abc"));
        assert_eq!(config.discord.guild_id, Some(273_534_239_310_479_360));
    }

    #[test]
    fn empty_config_is_valid() {
        let config = Config::parse("").unwrap();
        assert!(config.discord.token.is_none());
        assert!(config.discord.guild_id.is_none());
    }

    #[test]
    fn environment_token_wins() {
        let config = Config::parse("[discord]\ntoken = \"from-file\"").unwrap();
        assert_eq!(config.token(Some("from-env".to_owned())).unwrap(), "from-env");
        assert_eq!(config.token(None).unwrap(), "from-file");
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(Config::default().token(None).is_err());
        assert!(Config::default().token(Some("  ".to_owned())).is_err());
    }
}
