/// Phrase catalog: the fixed language → category → phrase mapping.
///
/// The catalog is embedded in the binary and read-only at runtime.
/// Selection is uniform random over the list for a (language, category)
/// pair. An empty list is a hard error, never a retry loop; the embedded
/// data keeps every pair non-empty, but the guard stays testable.

use rand::Rng;
use thiserror::Error;

// ── Languages / Categories ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hindi];

    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
        }
    }

    /// Cycle to the next language (wraps around).
    pub fn next(self) -> Self {
        match self {
            Language::English => Language::Hindi,
            Language::Hindi => Language::English,
        }
    }

    fn index(self) -> usize {
        match self {
            Language::English => 0,
            Language::Hindi => 1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    General,
    Movies,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::General, Category::Movies];

    pub fn label(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Movies => "Movies",
        }
    }

    /// Cycle to the next category (wraps around).
    pub fn next(self) -> Self {
        match self {
            Category::General => Category::Movies,
            Category::Movies => Category::General,
        }
    }

    fn index(self) -> usize {
        match self {
            Category::General => 0,
            Category::Movies => 1,
        }
    }
}

// ── Errors ──

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no phrases for {language} / {category}")]
    EmptyCategory {
        language: &'static str,
        category: &'static str,
    },
}

// ── Catalog ──

type PhraseList = &'static [&'static str];

pub struct PhraseCatalog {
    /// Indexed `[language][category]`.
    lists: [[PhraseList; 2]; 2],
}

const ENGLISH_GENERAL: PhraseList = &[
    "Dancing in the rain",
    "Climbing a mountain",
    "Flying a kite",
    "Playing guitar",
];

const ENGLISH_MOVIES: PhraseList = &[
    "The Lion King",
    "Jurassic Park",
    "Inception",
    "Titanic",
];

const HINDI_GENERAL: PhraseList = &[
    "Baarish mein naachna",
    "Pahad chadhna",
    "Patang udaana",
    "Guitar bajana",
];

const HINDI_MOVIES: PhraseList = &[
    "Sholay",
    "Dilwale Dulhania Le Jayenge",
    "3 Idiots",
    "Lagaan",
];

impl PhraseCatalog {
    /// The built-in catalog: two languages, two categories each.
    pub fn embedded() -> Self {
        PhraseCatalog {
            lists: [
                [ENGLISH_GENERAL, ENGLISH_MOVIES],
                [HINDI_GENERAL, HINDI_MOVIES],
            ],
        }
    }

    /// All phrases for a (language, category) pair.
    pub fn phrases(&self, language: Language, category: Category) -> PhraseList {
        self.lists[language.index()][category.index()]
    }

    /// Uniform random pick from a (language, category) pair.
    pub fn pick(
        &self,
        language: Language,
        category: Category,
        rng: &mut impl Rng,
    ) -> Result<&'static str, CatalogError> {
        let list = self.phrases(language, category);
        if list.is_empty() {
            return Err(CatalogError::EmptyCategory {
                language: language.label(),
                category: category.label(),
            });
        }
        Ok(list[rng.gen_range(0..list.len())])
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn every_pair_nonempty() {
        let cat = PhraseCatalog::embedded();
        for lang in Language::ALL {
            for c in Category::ALL {
                assert!(!cat.phrases(lang, c).is_empty(), "{}/{}", lang.label(), c.label());
            }
        }
    }

    #[test]
    fn pick_stays_in_list() {
        let cat = PhraseCatalog::embedded();
        let mut rng = rng();
        for _ in 0..50 {
            let p = cat.pick(Language::Hindi, Category::Movies, &mut rng).unwrap();
            assert!(cat.phrases(Language::Hindi, Category::Movies).contains(&p));
        }
    }

    #[test]
    fn empty_list_is_an_error() {
        let cat = PhraseCatalog { lists: [[&[], ENGLISH_MOVIES], [HINDI_GENERAL, HINDI_MOVIES]] };
        let mut rng = rng();
        let err = cat.pick(Language::English, Category::General, &mut rng).unwrap_err();
        assert_eq!(
            err,
            CatalogError::EmptyCategory { language: "English", category: "General" }
        );
    }

    #[test]
    fn language_cycle_wraps() {
        assert_eq!(Language::English.next(), Language::Hindi);
        assert_eq!(Language::Hindi.next(), Language::English);
        assert_eq!(Category::Movies.next(), Category::General);
    }
}
