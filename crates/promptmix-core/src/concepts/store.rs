//! Concepts Store
//!
//! 概念リストのランタイムストア。
//! カテゴリ別ファイルは呼び出しごとに読み直す（生成の合間に編集できるように）。
//! 背景語辞書だけは最初の利用時に一度だけ読み込む。

use std::fs;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{PromptMixError, Result};
use crate::sampler::Population;

use super::builtin::{
    find_category, BuiltinCategory, ConceptKind, BUILTIN_CATEGORIES, DEFAULT_ENABLED_CATEGORIES,
    DICTIONARY_FILE,
};
use super::file::parse_concepts;

/// 重みなしファイルに適用する重み
const DEFAULT_WEIGHT: f64 = 1.0;

/// 概念リストのストア
#[derive(Debug)]
pub struct ConceptsStore {
    concepts_dir: PathBuf,
    /// 有効なカテゴリ（BUILTIN_CATEGORIESの順）
    enabled: Vec<&'static str>,
    dictionary: OnceCell<Vec<String>>,
}

impl ConceptsStore {
    /// デフォルトカテゴリで初期化
    pub fn new(concepts_dir: impl Into<PathBuf>) -> Result<Self> {
        let concepts_dir = concepts_dir.into();
        if !concepts_dir.is_dir() {
            return Err(PromptMixError::InvalidConceptsDir { path: concepts_dir });
        }

        let mut store = Self {
            concepts_dir,
            enabled: Vec::new(),
            dictionary: OnceCell::new(),
        };
        for name in DEFAULT_ENABLED_CATEGORIES {
            store.enable(name)?;
        }
        Ok(store)
    }

    /// 有効カテゴリを置き換え
    pub fn with_categories<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        self.enabled.clear();
        for name in names {
            self.enable(name.as_ref())?;
        }
        Ok(self)
    }

    pub fn concepts_dir(&self) -> &Path {
        &self.concepts_dir
    }

    pub fn file_path(&self, file: &str) -> PathBuf {
        self.concepts_dir.join(file)
    }

    /// カテゴリを有効化
    pub fn enable(&mut self, name: &str) -> Result<()> {
        let category = lookup(name)?;
        if !self.enabled.contains(&category.name) {
            self.enabled.push(category.name);
            self.enabled.sort_by_key(|n| table_position(n));
        }
        Ok(())
    }

    /// カテゴリを無効化
    pub fn disable(&mut self, name: &str) -> Result<()> {
        let category = lookup(name)?;
        self.enabled.retain(|n| *n != category.name);
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        find_category(name).is_some_and(|c| self.enabled.contains(&c.name))
    }

    pub fn enabled_categories(&self) -> &[&'static str] {
        &self.enabled
    }

    /// カテゴリ名一覧（テーブル順）
    pub fn category_names(&self) -> Vec<&'static str> {
        BUILTIN_CATEGORIES.iter().map(|c| c.name).collect()
    }

    /// カテゴリのファイル一覧
    pub fn files_for_category(&self, name: &str) -> Result<Vec<&'static str>> {
        Ok(lookup(name)?.files())
    }

    /// 1ファイルを読み込む
    ///
    /// 読めないファイルは警告を出して空リスト扱い。
    pub fn load(&self, file: &str) -> Vec<String> {
        let path = self.file_path(file);
        match fs::read_to_string(&path) {
            Ok(content) => parse_concepts(&content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read concept file, using empty list");
                Vec::new()
            }
        }
    }

    /// 有効カテゴリからkindの母集団を構築
    ///
    /// 重み付きファイルが1つでもあれば重み付き母集団になる。
    pub fn population(&self, kind: ConceptKind) -> Population {
        let sources: Vec<_> = self
            .enabled_definitions()
            .flat_map(|c| c.sources_for(kind))
            .collect();

        if sources.iter().any(|s| s.weight.is_some()) {
            let items = sources
                .iter()
                .flat_map(|s| {
                    let weight = s.weight.unwrap_or(DEFAULT_WEIGHT);
                    self.load(s.file).into_iter().map(move |c| (c, weight))
                })
                .collect::<Vec<_>>();
            debug!(%kind, count = items.len(), "loaded weighted population");
            Population::Weighted(items)
        } else {
            let items = sources
                .iter()
                .flat_map(|s| self.load(s.file))
                .collect::<Vec<_>>();
            debug!(%kind, count = items.len(), "loaded population");
            Population::Plain(items)
        }
    }

    /// 背景語辞書（初回のみ読み込み）
    pub fn dictionary(&self) -> &[String] {
        self.dictionary.get_or_init(|| {
            let words = self.load(DICTIONARY_FILE);
            debug!(count = words.len(), "loaded dictionary");
            words
        })
    }

    /// 辞書キャッシュを破棄
    pub fn invalidate_dictionary(&mut self) {
        self.dictionary = OnceCell::new();
    }

    /// 概念ディレクトリ内の全`.txt`ファイル（名前順）
    pub fn concept_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/*.txt",
            Pattern::escape(&self.concepts_dir.to_string_lossy())
        );

        let mut files: Vec<PathBuf> = glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable concept file entry");
                    None
                }
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn enabled_definitions(&self) -> impl Iterator<Item = &'static BuiltinCategory> + '_ {
        self.enabled.iter().filter_map(|n| find_category(n))
    }
}

fn lookup(name: &str) -> Result<&'static BuiltinCategory> {
    find_category(name).ok_or_else(|| PromptMixError::UnknownCategory {
        name: name.to_string(),
    })
}

fn table_position(name: &str) -> usize {
    BUILTIN_CATEGORIES
        .iter()
        .position(|c| c.name == name)
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn concepts_dir(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        tmp
    }

    #[test]
    fn test_new_rejects_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let err = ConceptsStore::new(tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, PromptMixError::InvalidConceptsDir { .. }));
    }

    #[test]
    fn test_default_categories() {
        let tmp = concepts_dir(&[]);
        let store = ConceptsStore::new(tmp.path()).unwrap();
        assert_eq!(store.enabled_categories(), &["SFW", "Art Styles"]);
        assert!(store.is_enabled("sfw"));
        assert!(!store.is_enabled("NSFW"));
    }

    #[test]
    fn test_enable_disable() {
        let tmp = concepts_dir(&[]);
        let mut store = ConceptsStore::new(tmp.path()).unwrap();
        store.enable("nsfw").unwrap();
        assert_eq!(store.enabled_categories(), &["SFW", "NSFW", "Art Styles"]);
        store.disable("SFW").unwrap();
        assert_eq!(store.enabled_categories(), &["NSFW", "Art Styles"]);
        assert!(store.enable("unknown").is_err());

        let store = store.with_categories(&["Art Styles"]).unwrap();
        assert_eq!(store.enabled_categories(), &["Art Styles"]);
    }

    #[test]
    fn test_load_skips_comments() {
        let tmp = concepts_dir(&[("animals.txt", "# animals\ncat\n\ndog # good\n")]);
        let store = ConceptsStore::new(tmp.path()).unwrap();
        assert_eq!(store.load("animals.txt"), vec!["cat", "dog"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = concepts_dir(&[]);
        let store = ConceptsStore::new(tmp.path()).unwrap();
        assert!(store.load("animals.txt").is_empty());
        assert!(store.population(ConceptKind::Animals).is_empty());
    }

    #[test]
    fn test_population_merges_enabled_categories() {
        let tmp = concepts_dir(&[
            ("concepts.txt", "sunrise\nforest\n"),
            ("concepts_nsfw.txt", "secret\n"),
        ]);
        let mut store = ConceptsStore::new(tmp.path()).unwrap();
        assert_eq!(
            store.population(ConceptKind::Concepts),
            Population::Plain(vec!["sunrise".to_string(), "forest".to_string()])
        );

        store.enable("NSFW").unwrap();
        assert_eq!(store.population(ConceptKind::Concepts).len(), 3);
    }

    #[test]
    fn test_weighted_population() {
        let tmp = concepts_dir(&[
            ("dress.txt", "shirt\n"),
            ("dress_specific.txt", "red silk shirt\n"),
        ]);
        let store = ConceptsStore::new(tmp.path()).unwrap();
        assert_eq!(
            store.population(ConceptKind::Dress),
            Population::Weighted(vec![
                ("shirt".to_string(), 1.0),
                ("red silk shirt".to_string(), 0.5),
            ])
        );
    }

    #[test]
    fn test_population_rereads_files() {
        let tmp = concepts_dir(&[("colors.txt", "red\n")]);
        let store = ConceptsStore::new(tmp.path()).unwrap();
        assert_eq!(store.population(ConceptKind::Colors).len(), 1);

        fs::write(tmp.path().join("colors.txt"), "red\nblue\n").unwrap();
        assert_eq!(store.population(ConceptKind::Colors).len(), 2);
    }

    #[test]
    fn test_dictionary_is_cached() {
        let tmp = concepts_dir(&[(DICTIONARY_FILE, "alpha\nbeta\n")]);
        let mut store = ConceptsStore::new(tmp.path()).unwrap();
        assert_eq!(store.dictionary().len(), 2);

        fs::write(tmp.path().join(DICTIONARY_FILE), "alpha\n").unwrap();
        assert_eq!(store.dictionary().len(), 2);

        store.invalidate_dictionary();
        assert_eq!(store.dictionary().len(), 1);
    }

    #[test]
    fn test_concept_files_and_category_files() {
        let tmp = concepts_dir(&[("b.txt", ""), ("a.txt", ""), ("notes.md", "")]);
        let store = ConceptsStore::new(tmp.path()).unwrap();
        let names: Vec<String> = store
            .concept_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let files = store.files_for_category("Art Styles").unwrap();
        assert_eq!(files, vec!["artists.txt", "art_styles.txt"]);
        assert!(store.files_for_category("missing").is_err());
    }
}
