//! Configuration document and subtitle types
//!
//! Documents are fixed typed records. Reading applies the default-merge
//! rule: missing fields take the template value, unknown keys are dropped and
//! the color palette is merged key by key.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::asset::{ImageField, SocialSlot, ASSETS_PREFIX};
use super::EventId;

/// Palette keys every document carries, with their template values
pub const DEFAULT_COLORS: &[(&str, &str)] = &[
    ("primary", "#1e88e5"),
    ("secondary", "#263238"),
    ("background", "#000000"),
    ("text", "#ffffff"),
    ("accent", "#ffc107"),
];

pub const DEFAULT_POLL_INTERVAL: u32 = 60;
pub const DEFAULT_SUBTITLE_INTERVAL: u32 = 8;

/// Call-to-action button
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Button {
    pub title: String,
    pub link: String,
}

/// Social link with an optional icon asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Social {
    pub title: String,
    pub link: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Buttons {
    pub btn1: Button,
    pub btn2: Button,
    pub btn3: Button,
    pub btn4: Button,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Socials {
    pub social1: Social,
    pub social2: Social,
    pub social3: Social,
    pub social4: Social,
}

impl Socials {
    pub fn get(&self, slot: SocialSlot) -> &Social {
        match slot {
            SocialSlot::Social1 => &self.social1,
            SocialSlot::Social2 => &self.social2,
            SocialSlot::Social3 => &self.social3,
            SocialSlot::Social4 => &self.social4,
        }
    }

    pub fn get_mut(&mut self, slot: SocialSlot) -> &mut Social {
        match slot {
            SocialSlot::Social1 => &mut self.social1,
            SocialSlot::Social2 => &mut self.social2,
            SocialSlot::Social3 => &mut self.social3,
            SocialSlot::Social4 => &mut self.social4,
        }
    }
}

/// Per-event configuration document (`configuration.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigurationDocument {
    pub title: String,
    pub home_url: String,
    pub embed_code: String,
    pub start_time: String,
    pub end_time: String,
    /// Seconds between viewer refreshes of the document
    pub poll_interval: u32,
    /// Seconds each subtitle stays on screen
    pub subtitle_interval: u32,
    pub logo: String,
    pub pre_banner: String,
    pub end_banner: String,
    pub banner: String,
    pub colors: BTreeMap<String, String>,
    pub buttons: Buttons,
    pub socials: Socials,
}

impl Default for ConfigurationDocument {
    fn default() -> Self {
        Self {
            title: "New event".to_string(),
            home_url: String::new(),
            embed_code: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            subtitle_interval: DEFAULT_SUBTITLE_INTERVAL,
            logo: String::new(),
            pre_banner: String::new(),
            end_banner: String::new(),
            banner: String::new(),
            colors: default_colors(),
            buttons: Buttons::default(),
            socials: Socials::default(),
        }
    }
}

fn default_colors() -> BTreeMap<String, String> {
    DEFAULT_COLORS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl ConfigurationDocument {
    /// Template for a freshly created event
    pub fn template(name: &str) -> Self {
        Self {
            title: name.to_string(),
            ..Default::default()
        }
    }

    /// Parse stored bytes and apply the default-merge rule
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut doc: Self = serde_json::from_slice(bytes)?;
        doc.merge_defaults();
        Ok(doc)
    }

    /// Fill palette keys missing from `colors`
    pub fn merge_defaults(&mut self) {
        for (key, value) in DEFAULT_COLORS {
            self.colors
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    pub fn image(&self, field: ImageField) -> &str {
        match field {
            ImageField::Logo => &self.logo,
            ImageField::PreBanner => &self.pre_banner,
            ImageField::EndBanner => &self.end_banner,
            ImageField::Banner => &self.banner,
            ImageField::SocialIcon(slot) => &self.socials.get(slot).icon,
        }
    }

    pub fn image_mut(&mut self, field: ImageField) -> &mut String {
        match field {
            ImageField::Logo => &mut self.logo,
            ImageField::PreBanner => &mut self.pre_banner,
            ImageField::EndBanner => &mut self.end_banner,
            ImageField::Banner => &mut self.banner,
            ImageField::SocialIcon(slot) => &mut self.socials.get_mut(slot).icon,
        }
    }

    /// Every path-valued field with its current raw value
    pub fn image_fields(&self) -> impl Iterator<Item = (ImageField, &str)> {
        ImageField::all().map(move |field| (field, self.image(field)))
    }

    /// File names under `assets/<owner>/` referenced by this document
    pub fn referenced_files(&self, owner: &EventId) -> BTreeSet<String> {
        let prefix = format!("{}/{}/", ASSETS_PREFIX, owner);
        self.image_fields()
            .filter_map(|(_, value)| value.strip_prefix(&prefix))
            .map(str::to_string)
            .collect()
    }
}

/// Rewrite `assets/<from>/...` references in a raw configuration value
///
/// Only the path-valued fields are touched, so unknown keys, defaults that
/// were never written and key order all survive. Returns every rewritten
/// value as `(old, new)`.
pub fn rebase_asset_paths(value: &mut Value, from: &EventId, to: &EventId) -> Vec<(String, String)> {
    let old_prefix = format!("{}/{}/", ASSETS_PREFIX, from);
    let new_prefix = format!("{}/{}/", ASSETS_PREFIX, to);
    let mut changed = Vec::new();

    for field in ImageField::all() {
        let slot = match field {
            ImageField::SocialIcon(social) => value
                .get_mut("socials")
                .and_then(|socials| socials.get_mut(social.key()))
                .and_then(|entry| entry.get_mut("icon")),
            top_level => value.get_mut(top_level.key()),
        };
        let Some(Value::String(raw)) = slot else {
            continue;
        };
        if let Some(rest) = raw.strip_prefix(&old_prefix) {
            let rebased = format!("{}{}", new_prefix, rest);
            changed.push((std::mem::replace(raw, rebased.clone()), rebased));
        }
    }
    changed
}

/// One line of the subtitle ticker
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subtitle {
    pub text: String,
    pub link: String,
}

impl Subtitle {
    pub fn new(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: link.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> EventId {
        EventId::parse(raw).unwrap()
    }

    #[test]
    fn test_missing_fields_take_template_values() {
        let doc = ConfigurationDocument::from_slice(br#"{"title":"Launch"}"#).unwrap();
        assert_eq!(doc.title, "Launch");
        assert_eq!(doc.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(doc.colors.len(), DEFAULT_COLORS.len());
        assert_eq!(doc.buttons, Buttons::default());
    }

    #[test]
    fn test_colors_merge_key_by_key() {
        let doc = ConfigurationDocument::from_slice(
            br##"{"colors":{"primary":"#ff0000","brand":"#00ff00"}}"##,
        )
        .unwrap();
        assert_eq!(doc.colors["primary"], "#ff0000");
        assert_eq!(doc.colors["brand"], "#00ff00");
        assert_eq!(doc.colors["background"], "#000000");
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let doc = ConfigurationDocument::from_slice(br#"{"title":"x","favicon":"y"}"#).unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("favicon").is_none());
        assert!(json.get("preBanner").is_some());
    }

    #[test]
    fn test_rebase_rewrites_only_own_prefix() {
        let mut value = serde_json::json!({
            "logo": "assets/event_a/logo.png",
            "banner": "https://cdn.test/banner.png",
            "endBanner": "assets/event_ab/end.png",
            "notes": "assets/event_a/logo.png",
            "socials": {"social2": {"icon": "assets/event_a/x.svg", "title": "Chat"}}
        });

        let changed = rebase_asset_paths(&mut value, &id("event_a"), &id("demo2"));

        assert_eq!(changed.len(), 2);
        assert_eq!(value["logo"], "assets/demo2/logo.png");
        assert_eq!(value["socials"]["social2"]["icon"], "assets/demo2/x.svg");
        assert_eq!(value["socials"]["social2"]["title"], "Chat");
        assert_eq!(value["banner"], "https://cdn.test/banner.png");
        assert_eq!(value["endBanner"], "assets/event_ab/end.png");
        assert_eq!(value["notes"], "assets/event_a/logo.png");
        assert_eq!(changed[0], ("assets/event_a/logo.png".to_string(), "assets/demo2/logo.png".to_string()));
    }

    #[test]
    fn test_rebase_ignores_non_object_shapes() {
        let mut value = serde_json::json!(["assets/event_a/logo.png"]);
        assert!(rebase_asset_paths(&mut value, &id("event_a"), &id("demo2")).is_empty());

        let mut value = serde_json::json!({"logo": 3, "socials": "none"});
        assert!(rebase_asset_paths(&mut value, &id("event_a"), &id("demo2")).is_empty());
    }

    #[test]
    fn test_referenced_files() {
        let mut doc = ConfigurationDocument::default();
        doc.logo = "assets/a/logo.png".to_string();
        doc.socials.social1.icon = "assets/a/icon.svg".to_string();
        doc.banner = "assets/b/other.png".to_string();

        let files = doc.referenced_files(&id("a"));
        assert_eq!(files.len(), 2);
        assert!(files.contains("logo.png"));
        assert!(files.contains("icon.svg"));
    }

    #[test]
    fn test_subtitle_fields_default_to_empty() {
        let subs: Vec<Subtitle> =
            serde_json::from_str(r#"[{"text":"Hello"},{"link":"https://x.test"}]"#).unwrap();
        assert_eq!(subs[0], Subtitle::new("Hello", ""));
        assert_eq!(subs[1], Subtitle::new("", "https://x.test"));
        assert!(subs[1].is_blank());
        assert!(Subtitle::new("  ", "x").is_blank());
    }
}
