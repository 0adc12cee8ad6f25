//! Kind registry
//!
//! Every practice item has a kind. The kind decides which `values` fields the
//! item carries, how the item form is built and how many notes (♪) a logged
//! session is worth.
//!
//! | Kind | Fields | Reward |
//! |------|--------|--------|
//! | `riff` | targetBpm, notes | 1 |
//! | `bassbuzz` | module, lesson, link | 2 |
//! | `exercise` | link, focus | 1 |
//! | `warmup` | description | 1 |
//! | `theory` | topic, link | 1 |
//! | `resource` | link, description | 0 |
//! | `stamina` | duration, bpm, description | 1 |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Riff,
    Bassbuzz,
    Exercise,
    Warmup,
    Theory,
    Resource,
    Stamina,
}

/// Registry order, also used for the kind select in the item form
pub const ALL_KINDS: [Kind; 7] = [
    Kind::Riff,
    Kind::Bassbuzz,
    Kind::Exercise,
    Kind::Warmup,
    Kind::Theory,
    Kind::Resource,
    Kind::Stamina,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    Text,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldDefault {
    Number(u32),
    Text(&'static str),
}

impl fmt::Display for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Number(n) => write!(f, "{}", n),
            FieldDefault::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Schema of one `values` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: &'static str,
    pub required: bool,
    pub default: Option<FieldDefault>,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindDefinition {
    pub kind: Kind,
    pub label: &'static str,
    pub fields: &'static [FieldDef],
    pub default_reward: u32,
}

impl KindDefinition {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const fn number(
    name: &'static str,
    label: &'static str,
    required: bool,
    default: Option<u32>,
    min: u32,
    max: u32,
) -> FieldDef {
    FieldDef {
        name,
        field_type: FieldType::Number,
        label,
        required,
        default: match default {
            Some(n) => Some(FieldDefault::Number(n)),
            None => None,
        },
        min: Some(min),
        max: Some(max),
    }
}

const fn text(name: &'static str, label: &'static str, field_type: FieldType, required: bool) -> FieldDef {
    FieldDef {
        name,
        field_type,
        label,
        required,
        default: Some(FieldDefault::Text("")),
        min: None,
        max: None,
    }
}

static RIFF: KindDefinition = KindDefinition {
    kind: Kind::Riff,
    label: "Riff",
    fields: &[
        number("targetBpm", "Target BPM", false, Some(100), 40, 300),
        text("notes", "Tab/Notes", FieldType::Text, false),
    ],
    default_reward: 1,
};

static BASSBUZZ: KindDefinition = KindDefinition {
    kind: Kind::Bassbuzz,
    label: "BassBuzz",
    fields: &[
        number("module", "Module", true, None, 1, 20),
        number("lesson", "Lesson", true, None, 1, 50),
        text("link", "Link", FieldType::Url, false),
    ],
    default_reward: 2,
};

static EXERCISE: KindDefinition = KindDefinition {
    kind: Kind::Exercise,
    label: "Exercise",
    fields: &[
        text("link", "Link", FieldType::Url, false),
        text("focus", "Focus", FieldType::Text, false),
    ],
    default_reward: 1,
};

static WARMUP: KindDefinition = KindDefinition {
    kind: Kind::Warmup,
    label: "Warm-up",
    fields: &[text("description", "Description", FieldType::Text, false)],
    default_reward: 1,
};

static THEORY: KindDefinition = KindDefinition {
    kind: Kind::Theory,
    label: "Theory",
    fields: &[
        text("topic", "Topic", FieldType::Text, false),
        text("link", "Link", FieldType::Url, false),
    ],
    default_reward: 1,
};

// Resources are tools, not practice: no notes
static RESOURCE: KindDefinition = KindDefinition {
    kind: Kind::Resource,
    label: "Resource",
    fields: &[
        text("link", "Link", FieldType::Url, true),
        text("description", "Description", FieldType::Text, false),
    ],
    default_reward: 0,
};

static STAMINA: KindDefinition = KindDefinition {
    kind: Kind::Stamina,
    label: "Stamina",
    fields: &[
        number("duration", "Duration (seconds)", true, Some(60), 30, 600),
        number("bpm", "BPM", true, Some(120), 40, 300),
        text("description", "Description", FieldType::Text, false),
    ],
    default_reward: 1,
};

static DEFINITIONS: [&KindDefinition; 7] =
    [&RIFF, &BASSBUZZ, &EXERCISE, &WARMUP, &THEORY, &RESOURCE, &STAMINA];

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Riff => "riff",
            Kind::Bassbuzz => "bassbuzz",
            Kind::Exercise => "exercise",
            Kind::Warmup => "warmup",
            Kind::Theory => "theory",
            Kind::Resource => "resource",
            Kind::Stamina => "stamina",
        }
    }

    pub fn definition(&self) -> &'static KindDefinition {
        match self {
            Kind::Riff => &RIFF,
            Kind::Bassbuzz => &BASSBUZZ,
            Kind::Exercise => &EXERCISE,
            Kind::Warmup => &WARMUP,
            Kind::Theory => &THEORY,
            Kind::Resource => &RESOURCE,
            Kind::Stamina => &STAMINA,
        }
    }

    pub fn label(&self) -> &'static str {
        self.definition().label
    }

    pub fn default_reward(&self) -> u32 {
        self.definition().default_reward
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KINDS
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown kind '{}'", s))
    }
}

/// Look up a kind by its registry key
pub fn get_definition(kind: &str) -> Option<&'static KindDefinition> {
    kind.parse::<Kind>().ok().map(|k| k.definition())
}

/// Display label for a kind key, falling back to the raw key
pub fn label_for(kind: &str) -> &str {
    get_definition(kind).map(|d| d.label).unwrap_or(kind)
}

pub fn all_definitions() -> &'static [&'static KindDefinition] {
    &DEFINITIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_kind() {
        let def = get_definition("riff").unwrap();
        assert_eq!(def.label, "Riff");
        assert_eq!(def.default_reward, 1);
        assert_eq!(def.fields.len(), 2);
        assert_eq!(def.field("targetBpm").unwrap().default, Some(FieldDefault::Number(100)));
    }

    #[test]
    fn test_lookup_unknown_kind() {
        assert!(get_definition("drums").is_none());
        assert_eq!(label_for("drums"), "drums");
        assert_eq!(label_for("warmup"), "Warm-up");
    }

    #[test]
    fn test_rewards() {
        assert_eq!(Kind::Bassbuzz.default_reward(), 2);
        assert_eq!(Kind::Resource.default_reward(), 0);
        assert_eq!(Kind::Exercise.default_reward(), 1);
    }

    #[test]
    fn test_registry_order_matches_all_kinds() {
        let kinds: Vec<Kind> = all_definitions().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, ALL_KINDS.to_vec());
        for kind in ALL_KINDS {
            assert_eq!(kind.definition().kind, kind);
            assert_eq!(kind.as_str().parse::<Kind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_required_fields() {
        let bassbuzz = Kind::Bassbuzz.definition();
        assert!(bassbuzz.field("module").unwrap().required);
        assert!(bassbuzz.field("module").unwrap().default.is_none());
        assert!(!bassbuzz.field("link").unwrap().required);

        let resource = Kind::Resource.definition();
        assert_eq!(resource.field("link").unwrap().field_type, FieldType::Url);
        assert!(resource.field("link").unwrap().required);
    }

    #[test]
    fn test_definition_serializes_like_registry() {
        let json = serde_json::to_value(Kind::Stamina.definition()).unwrap();
        assert_eq!(json["label"], "Stamina");
        assert_eq!(json["defaultReward"], 1);
        assert_eq!(json["fields"][0]["type"], "number");
        assert_eq!(json["fields"][0]["default"], 60);
    }
}
