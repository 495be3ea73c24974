//! Stateless presentation of cards and sets.
//!
//! Produces plain data (`CardView`, `SetView`) that a chat gateway binding
//! turns into its own containers, embeds and buttons. Nothing here knows
//! about a particular chat platform.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::models::{Card, CardSet};

pub const EMBED_COLOR: u32 = 0xE1452D;
pub const COLOR_GRAY: u32 = 0x95A5A6;
pub const COLOR_WHITE: u32 = 0xF8F6D8;
pub const COLOR_BLUE: u32 = 0x3498DB;
pub const COLOR_BLACK: u32 = 0x23272A;
pub const COLOR_RED: u32 = 0xE74C3C;
pub const COLOR_GREEN: u32 = 0x2ECC71;
pub const COLOR_GOLD: u32 = 0xF1C40F;

// ---------------------------------------------------------------------------
// SymbolMap
// ---------------------------------------------------------------------------

/// Mana and color-identity symbol names mapped to their rendered form
/// (typically a custom emoji mention).
///
/// Mana symbols are keyed by their bare name (`"U"`, `"C"`, `"0"`), color
/// identity pips by `"CI_<color>"`.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    symbols: HashMap<String, String>,
}

impl SymbolMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, rendered: impl Into<String>) -> &mut Self {
        self.symbols.insert(name.into(), rendered.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.symbols.get(name).map(String::as_str)
    }

    /// Replace `{X}` symbols in `subject`.
    ///
    /// Known symbols are substituted directly. Unknown numeric symbols expand
    /// to that many colorless (`C`) symbols, or the `0` symbol for zero.
    /// Anything else is left untouched.
    pub fn replace_symbols(&self, subject: &str) -> String {
        let mut out = String::with_capacity(subject.len());
        let mut rest = subject;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            let name = &after[..close];
            match self.render_symbol(name) {
                Some(rendered) => out.push_str(&rendered),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }

    fn render_symbol(&self, name: &str) -> Option<String> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        if let Some(rendered) = self.get(name) {
            return Some(rendered.to_string());
        }
        let count: usize = name.parse().ok()?;
        if count == 0 {
            return self.get("0").map(str::to_string);
        }
        self.get("C").map(|c| c.repeat(count))
    }

    fn color_identity(&self, colors: &[String]) -> String {
        colors
            .iter()
            .filter_map(|c| self.get(&format!("CI_{}", c)))
            .collect()
    }
}

/// Accent color for a color identity: gray when colorless, gold when multicolored.
pub fn color_identity_to_color(identity: &[String]) -> u32 {
    match identity {
        [] => COLOR_GRAY,
        [single] => match single.as_str() {
            "W" => COLOR_WHITE,
            "U" => COLOR_BLUE,
            "B" => COLOR_BLACK,
            "R" => COLOR_RED,
            "G" => COLOR_GREEN,
            _ => EMBED_COLOR,
        },
        _ => COLOR_GOLD,
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardDetails {
    /// Color identity pips, name and mana cost.
    pub title: String,
    /// Type line with rarity, e.g. `Legendary Creature - Elf (Rare)`.
    pub type_line: String,
    pub set_button: Option<Button>,
    pub text: Option<String>,
    pub power_toughness: Option<String>,
    pub color: u32,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CardView {
    Image { title: String, image_url: String },
    Detailed(CardDetails),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetView {
    pub title: String,
    pub lines: Vec<String>,
    pub color: u32,
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render a card.
///
/// With `image_only` and an image available, only the image is shown.
/// Otherwise `normal` and `meld` layouts get a detailed view; other layouts
/// and nameless cards render nothing.
pub fn present_card(card: &Card, symbols: &SymbolMap, image_only: bool) -> Option<CardView> {
    if image_only {
        if let Some(url) = &card.image_url {
            return Some(CardView::Image {
                title: display_name(card),
                image_url: url.clone(),
            });
        }
    }

    if card.name.is_empty() {
        return None;
    }
    match card.layout.as_deref() {
        Some("normal") | Some("meld") => Some(CardView::Detailed(detailed(card, symbols))),
        _ => None,
    }
}

fn display_name(card: &Card) -> String {
    if card.name.is_empty() {
        "Untitled".to_string()
    } else {
        card.name.clone()
    }
}

fn detailed(card: &Card, symbols: &SymbolMap) -> CardDetails {
    let pips = symbols.color_identity(&card.color_identity);
    let mana = symbols.replace_symbols(card.mana_cost.as_deref().unwrap_or(""));
    let title = [pips.as_str(), card.name.as_str(), mana.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let mut type_line = card.type_line();
    if let Some(rarity) = &card.rarity {
        type_line.push_str(&format!(" ({})", rarity));
    }

    let set_button = card.set.as_ref().map(|set| Button {
        custom_id: format!("SET_{}", set),
        label: set.clone(),
        disabled: true,
    });

    let power_toughness = match (&card.power, &card.toughness) {
        (Some(p), Some(t)) => Some(format!(
            "({}/{})",
            p.replace('*', "\\*"),
            t.replace('*', "\\*")
        )),
        _ => None,
    };

    let mut buttons = vec![Button {
        custom_id: format!("JSON_{}", card.id),
        label: "JSON".to_string(),
        disabled: false,
    }];
    if card.image_url.is_some() {
        buttons.push(Button {
            custom_id: format!("VIEW_IMAGE_{}", card.id),
            label: "View Image".to_string(),
            disabled: false,
        });
    }

    CardDetails {
        title,
        type_line,
        set_button,
        text: card.text.as_deref().map(|t| symbols.replace_symbols(t)),
        power_toughness,
        color: color_identity_to_color(&card.color_identity),
        buttons,
    }
}

/// Pretty-printed JSON attachment for a card: `(file name, contents)`.
pub fn card_json(card: &Card) -> Result<(String, String)> {
    Ok((format!("{}.json", card.id), serde_json::to_string_pretty(card)?))
}

pub fn present_set(set: &CardSet) -> SetView {
    let mut lines = Vec::new();
    if let Some(t) = &set.type_field {
        lines.push(format!("Type: {}", t));
    }
    if let Some(block) = &set.block {
        lines.push(format!("Block: {}", block));
    }
    if let Some(date) = set.release_date_as_date() {
        lines.push(format!("Released: {}", date.format("%B %-d, %Y")));
    }
    if set.online_only == Some(true) {
        lines.push("Online only".to_string());
    }
    SetView {
        title: format!("{} ({})", set.name, set.code),
        lines,
        color: EMBED_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn symbols() -> SymbolMap {
        let mut map = SymbolMap::new();
        map.insert("U", "<:U_:1>")
            .insert("C", "<:C_:2>")
            .insert("0", "<:0_:3>")
            .insert("CI_U", "<:CI_U_:4>");
        map
    }

    #[test]
    fn replaces_known_and_numeric_symbols() {
        let s = symbols();
        assert_eq!(s.replace_symbols("{2}{U}"), "<:C_:2><:C_:2><:U_:1>");
        assert_eq!(s.replace_symbols("{0}"), "<:0_:3>");
        assert_eq!(s.replace_symbols("{G} and {T"), "{G} and {T");
    }

    #[test]
    fn detailed_view_for_normal_layout() {
        let card: Card = serde_json::from_value(json!({
            "id": "abc",
            "name": "Tarmogoyf",
            "layout": "normal",
            "manaCost": "{1}{U}",
            "colorIdentity": ["U"],
            "types": ["Creature"],
            "subtypes": ["Lhurgoyf"],
            "rarity": "Rare",
            "set": "FUT",
            "power": "*",
            "toughness": "1+*"
        }))
        .unwrap();

        let Some(CardView::Detailed(view)) = present_card(&card, &symbols(), true) else {
            panic!("expected detailed view");
        };
        assert_eq!(view.title, "<:CI_U_:4> Tarmogoyf <:C_:2><:U_:1>");
        assert_eq!(view.type_line, "Creature - Lhurgoyf (Rare)");
        assert_eq!(view.power_toughness.as_deref(), Some("(\\*/1+\\*)"));
        assert_eq!(view.set_button.unwrap().custom_id, "SET_FUT");
        assert_eq!(view.color, COLOR_BLUE);
        assert_eq!(view.buttons.len(), 1);
    }

    #[test]
    fn image_only_prefers_image() {
        let card: Card = serde_json::from_value(json!({
            "id": "abc",
            "name": "Black Lotus",
            "layout": "normal",
            "imageUrl": "http://example.test/lotus.png"
        }))
        .unwrap();
        assert!(matches!(
            present_card(&card, &SymbolMap::new(), true),
            Some(CardView::Image { .. })
        ));
    }

    #[test]
    fn split_layout_renders_nothing() {
        let card: Card =
            serde_json::from_value(json!({"id": "x", "name": "Fire // Ice", "layout": "split"}))
                .unwrap();
        assert_eq!(present_card(&card, &SymbolMap::new(), false), None);
    }

    #[test]
    fn json_attachment_is_named_by_id() {
        let card: Card =
            serde_json::from_value(json!({"id": "abc", "name": "Black Lotus", "manaCost": "{0}"}))
                .unwrap();
        let (name, contents) = card_json(&card).unwrap();
        assert_eq!(name, "abc.json");
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["name"], "Black Lotus");
        assert_eq!(parsed["manaCost"], "{0}");
        assert!(contents.contains('\n'));
    }

    #[test]
    fn set_view_lists_known_attributes() {
        let set: CardSet = serde_json::from_value(json!({
            "code": "KTK",
            "name": "Khans of Tarkir",
            "type": "expansion",
            "block": "Khans of Tarkir",
            "releaseDate": "2014-09-26",
            "onlineOnly": false
        }))
        .unwrap();

        let view = present_set(&set);
        assert_eq!(view.title, "Khans of Tarkir (KTK)");
        assert_eq!(
            view.lines,
            vec![
                "Type: expansion",
                "Block: Khans of Tarkir",
                "Released: September 26, 2014",
            ]
        );
        assert_eq!(view.color, EMBED_COLOR);
    }

    #[test]
    fn online_only_set_is_flagged() {
        let set: CardSet =
            serde_json::from_value(json!({"code": "ME4", "name": "Masters Edition IV", "onlineOnly": true}))
                .unwrap();
        assert_eq!(present_set(&set).lines, vec!["Online only"]);
    }

    #[test]
    fn identity_colors() {
        assert_eq!(color_identity_to_color(&[]), COLOR_GRAY);
        assert_eq!(color_identity_to_color(&["W".into(), "U".into()]), COLOR_GOLD);
    }
}
