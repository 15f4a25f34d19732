// SPDX-FileCopyrightText: 2026 Codunot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Codunot.
//!
//! Provides the error type, the domain types shared by the state stores and
//! the usage ledger, the collaborator traits the message glue talks to, and
//! the JSON persistence helpers.

pub mod error;
pub mod persist;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CodunotError;
pub use traits::{Generator, QuotaSubject};
pub use types::{
    ChannelId, EntityKey, InboundMessage, Limit, Mode, Mood, PromptContext, ResourceKind, Tier,
};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn mood_detects_whole_keywords() {
        assert_eq!(Mood::detect("LOL that was great"), Mood::Happy);
        assert_eq!(Mood::detect("i want to cry"), Mood::Sad);
        assert_eq!(Mood::detect("wtf, really?"), Mood::Angry);
        assert_eq!(Mood::detect("we made it"), Mood::Neutral);
        assert_eq!(Mood::detect("lol I'm so mad"), Mood::Happy);
    }

    #[test]
    fn mode_parses_canonical_and_legacy_names() {
        assert_eq!(Mode::parse("roast").unwrap(), Mode::Roast);
        assert_eq!(Mode::parse("Serious").unwrap(), Mode::Serious);
        assert_eq!(Mode::parse("funny").unwrap(), Mode::Default);
        assert_eq!(Mode::parse("chess").unwrap(), Mode::Game);
        assert_eq!(Mode::parse("codemode").unwrap(), Mode::Code);
        assert_eq!(Mode::parse(" game ").unwrap(), Mode::Game);
    }

    #[test]
    fn mode_rejects_unknown_names() {
        let err = Mode::parse("pirate").unwrap_err();
        assert!(matches!(err, CodunotError::InvalidMode { ref value } if value == "pirate"));
    }

    #[test]
    fn mode_displays_canonical_name() {
        assert_eq!(Mode::Default.to_string(), "default");
        assert_eq!(Mode::Code.to_string(), "code");
        assert_eq!(
            Mode::names(),
            vec!["default", "serious", "roast", "code", "game"]
        );
    }

    #[test]
    fn mode_serde_accepts_legacy_alias() {
        let mode: Mode = serde_json::from_str("\"chess\"").unwrap();
        assert_eq!(mode, Mode::Game);
        assert_eq!(serde_json::to_string(&Mode::Game).unwrap(), "\"game\"");
    }

    #[test]
    fn only_attachments_are_rolling_limited() {
        assert!(ResourceKind::Attachments.is_rolling_limited());
        assert!(!ResourceKind::Messages.is_rolling_limited());
        assert_eq!(ResourceKind::Attachments.to_string(), "attachments");
        assert_eq!(Tier::Gold.to_string(), "gold");
    }

    #[test]
    fn unlimited_limit_always_allows() {
        assert!(Limit::UNLIMITED.allows(u64::MAX));
        assert!(Limit::new(50).allows(49));
        assert!(!Limit::new(50).allows(50));
        assert!(!Limit::new(0).allows(0));
    }

    #[test]
    fn limit_deserializes_from_number_or_word() {
        let limits: Vec<Limit> = serde_json::from_str(r#"[7, 2.5, "unlimited"]"#).unwrap();
        assert_eq!(limits[0], Limit::new(7));
        assert_eq!(limits[1], Limit(2.5));
        assert!(limits[2].is_unlimited());
        assert!(serde_json::from_str::<Limit>(r#""lots""#).is_err());
        assert_eq!(
            serde_json::to_string(&Limit::UNLIMITED).unwrap(),
            r#""unlimited""#
        );
        assert_eq!(Limit::new(30).to_string(), "30");
    }

    struct DmSubject {
        channel: ChannelId,
        guild: Option<String>,
    }

    #[async_trait]
    impl QuotaSubject for DmSubject {
        fn channel_id(&self) -> &ChannelId {
            &self.channel
        }
        fn guild_id(&self) -> Option<&str> {
            self.guild.as_deref()
        }
        fn author_id(&self) -> &str {
            "u1"
        }
        async fn reply(&self, _text: &str) -> Result<(), CodunotError> {
            Ok(())
        }
    }

    #[test]
    fn quota_key_prefers_guild_over_channel() {
        let in_guild = DmSubject {
            channel: ChannelId::from("c1"),
            guild: Some("g1".into()),
        };
        assert_eq!(in_guild.quota_key(), EntityKey::from("g1"));

        let dm = DmSubject {
            channel: ChannelId::from("c2"),
            guild: None,
        };
        assert_eq!(dm.quota_key(), EntityKey::from("c2"));
        assert!(!dm.is_privileged());
    }

    #[test]
    fn error_messages_name_their_context() {
        let err = CodunotError::persistence("/tmp/x.json", std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "persistence error for /tmp/x.json: disk full");
        let err = CodunotError::Timeout {
            duration: std::time::Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "operation timed out after 3s");
    }
}
