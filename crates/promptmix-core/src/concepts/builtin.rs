//! Builtin Category Definitions
//!
//! コード内で定義されるビルトインカテゴリ。
//! カテゴリ名から概念リストファイルへの静的テーブル。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PromptMixError;

/// 背景語辞書（カテゴリに属さない）
pub const DICTIONARY_FILE: &str = "dictionary.txt";

/// デフォルトで有効なカテゴリ
pub const DEFAULT_ENABLED_CATEGORIES: &[&str] = &["SFW", "Art Styles"];

/// 概念リストファイルの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptKind {
    Concepts,
    Positions,
    Locations,
    Animals,
    Colors,
    Times,
    Dress,
    Expressions,
    Actions,
    Descriptions,
    Characters,
    Artists,
    ArtStyles,
}

impl ConceptKind {
    pub const ALL: &'static [ConceptKind] = &[
        Self::Concepts,
        Self::Positions,
        Self::Locations,
        Self::Animals,
        Self::Colors,
        Self::Times,
        Self::Dress,
        Self::Expressions,
        Self::Actions,
        Self::Descriptions,
        Self::Characters,
        Self::Artists,
        Self::ArtStyles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concepts => "concepts",
            Self::Positions => "positions",
            Self::Locations => "locations",
            Self::Animals => "animals",
            Self::Colors => "colors",
            Self::Times => "times",
            Self::Dress => "dress",
            Self::Expressions => "expressions",
            Self::Actions => "actions",
            Self::Descriptions => "descriptions",
            Self::Characters => "characters",
            Self::Artists => "artists",
            Self::ArtStyles => "art_styles",
        }
    }
}

impl fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConceptKind {
    type Err = PromptMixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| PromptMixError::UnknownKind {
                name: s.to_string(),
            })
    }
}

/// カテゴリ内の1ファイル
#[derive(Debug, Clone, Copy)]
pub struct ConceptSource {
    /// ファイルの役割
    pub kind: ConceptKind,
    /// 概念ディレクトリ内のファイル名
    pub file: &'static str,
    /// 採用重み（None = 重みなし、同じkindに重み付きファイルがあれば1.0扱い）
    pub weight: Option<f64>,
}

const fn source(kind: ConceptKind, file: &'static str) -> ConceptSource {
    ConceptSource {
        kind,
        file,
        weight: None,
    }
}

const fn weighted(kind: ConceptKind, file: &'static str, weight: f64) -> ConceptSource {
    ConceptSource {
        kind,
        file,
        weight: Some(weight),
    }
}

/// ビルトインカテゴリの静的定義
#[derive(Debug, Clone)]
pub struct BuiltinCategory {
    /// カテゴリ名（一意識別子）
    pub name: &'static str,
    /// カテゴリの説明
    pub description: &'static str,
    /// ファイル一覧（順序どおりに読み込む）
    pub sources: &'static [ConceptSource],
}

impl BuiltinCategory {
    /// 指定kindのファイル
    pub fn sources_for(&self, kind: ConceptKind) -> impl Iterator<Item = &ConceptSource> {
        self.sources.iter().filter(move |s| s.kind == kind)
    }

    pub fn files(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.file).collect()
    }
}

/// ビルトインカテゴリ定義
pub const BUILTIN_CATEGORIES: &[BuiltinCategory] = &[
    BuiltinCategory {
        name: "SFW",
        description: "General purpose concepts safe for any audience.",
        sources: &[
            source(ConceptKind::Concepts, "concepts.txt"),
            source(ConceptKind::Positions, "positions.txt"),
            weighted(ConceptKind::Locations, "locations.txt", 1.0),
            weighted(ConceptKind::Locations, "locations_specific.txt", 0.25),
            source(ConceptKind::Animals, "animals.txt"),
            source(ConceptKind::Colors, "colors.txt"),
            source(ConceptKind::Times, "times.txt"),
            weighted(ConceptKind::Dress, "dress.txt", 1.0),
            weighted(ConceptKind::Dress, "dress_specific.txt", 0.5),
            source(ConceptKind::Expressions, "expressions.txt"),
            source(ConceptKind::Actions, "actions.txt"),
            source(ConceptKind::Descriptions, "descriptions.txt"),
            source(ConceptKind::Characters, "characters.txt"),
        ],
    },
    BuiltinCategory {
        name: "NSFW",
        description: "Adult concepts. Disabled unless explicitly enabled.",
        sources: &[
            source(ConceptKind::Concepts, "concepts_nsfw.txt"),
            source(ConceptKind::Positions, "positions_nsfw.txt"),
            weighted(ConceptKind::Dress, "dress_nsfw.txt", 0.5),
            source(ConceptKind::Actions, "actions_nsfw.txt"),
            source(ConceptKind::Descriptions, "descriptions_nsfw.txt"),
        ],
    },
    BuiltinCategory {
        name: "NSFL",
        description: "Disturbing concepts. Disabled unless explicitly enabled.",
        sources: &[
            source(ConceptKind::Concepts, "concepts_nsfl.txt"),
            source(ConceptKind::Actions, "actions_nsfl.txt"),
            source(ConceptKind::Descriptions, "descriptions_nsfl.txt"),
        ],
    },
    BuiltinCategory {
        name: "Art Styles",
        description: "Artists and named art styles.",
        sources: &[
            source(ConceptKind::Artists, "artists.txt"),
            source(ConceptKind::ArtStyles, "art_styles.txt"),
        ],
    },
];

/// 名前でカテゴリを検索（大文字小文字を区別しない）
pub fn find_category(name: &str) -> Option<&'static BuiltinCategory> {
    BUILTIN_CATEGORIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_categories_exist() {
        assert!(!BUILTIN_CATEGORIES.is_empty());
        for name in ["SFW", "NSFW", "NSFL", "Art Styles"] {
            assert!(find_category(name).is_some(), "missing {}", name);
        }
        assert!(find_category("art styles").is_some());
        assert!(find_category("nope").is_none());
    }

    #[test]
    fn test_default_categories_are_builtin() {
        for name in DEFAULT_ENABLED_CATEGORIES {
            assert!(find_category(name).is_some());
        }
    }

    #[test]
    fn test_files_are_unique() {
        let mut seen = HashSet::new();
        for category in BUILTIN_CATEGORIES {
            for file in category.files() {
                assert!(seen.insert(file), "duplicate file {}", file);
            }
        }
        assert!(!seen.contains(DICTIONARY_FILE));
    }

    #[test]
    fn test_weights_in_range() {
        for category in BUILTIN_CATEGORIES {
            for s in category.sources {
                if let Some(w) = s.weight {
                    assert!(w > 0.0 && w <= 1.0);
                }
            }
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("dress".parse::<ConceptKind>().unwrap(), ConceptKind::Dress);
        assert_eq!(
            "Art Styles".parse::<ConceptKind>().unwrap(),
            ConceptKind::ArtStyles
        );
        assert_eq!(
            "art-styles".parse::<ConceptKind>().unwrap(),
            ConceptKind::ArtStyles
        );
        assert!("weather".parse::<ConceptKind>().is_err());
        for kind in ConceptKind::ALL {
            assert_eq!(kind.as_str().parse::<ConceptKind>().unwrap(), *kind);
        }
    }
}
