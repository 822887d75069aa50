//! # Concepts Module
//!
//! プロンプトに埋め込む概念リスト（プレーンテキスト）を扱う。
//!
//! ## モジュール構成
//!
//! - `builtin`: カテゴリ名 → ファイルの静的テーブル
//! - `store`: 概念ディレクトリからの読み込み
//! - `file`: 概念リストファイルのパース
//! - `editor`: コメント・並び順を保ったままの追加/削除
//!
//! ## 使用例
//!
//! ```rust
//! use promptmix_core::concepts::{ConceptFile, ConceptFileEditor};
//! use std::path::PathBuf;
//!
//! let file = ConceptFile::from_lines(&["apple", "banana", "cherry"]);
//! let mut editor = ConceptFileEditor::from_file(PathBuf::from("fruits.txt"), file);
//!
//! assert!(editor.add_concept("banana2"));
//! assert!(!editor.add_concept("apple"));
//! assert_eq!(editor.lines(), &["apple", "banana", "banana2", "cherry"]);
//! ```
//!
//! ```rust,ignore
//! use promptmix_core::concepts::{ConceptKind, ConceptsStore};
//!
//! let mut store = ConceptsStore::new("/path/to/concepts")?;
//! store.enable("NSFW")?;
//! let population = store.population(ConceptKind::Dress);
//! ```

mod builtin;
mod editor;
mod file;
mod store;

// Re-exports
pub use builtin::{
    find_category, BuiltinCategory, ConceptKind, ConceptSource, BUILTIN_CATEGORIES,
    DEFAULT_ENABLED_CATEGORIES, DICTIONARY_FILE,
};
pub use editor::ConceptFileEditor;
pub use file::{parse_concept_line, parse_concepts, ConceptFile};
pub use store::ConceptsStore;
