//! Word <-> id lookup for caption tokens.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CaptionError;

pub type TokenId = i64;

pub const START_WORD: &str = "<S>";
pub const END_WORD: &str = "</S>";
pub const UNKNOWN_WORD: &str = "<UNK>";

static PUNCT_SPACE_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\s+([.,!?;:])"));

#[derive(Debug, Clone)]
pub struct Vocabulary {
    ids: HashMap<String, TokenId>,
    words: HashMap<TokenId, String>,
    start_id: TokenId,
    end_id: TokenId,
    unknown_id: Option<TokenId>,
}

impl Vocabulary {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptionError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let vocab = Self::parse(&content)?;
        log::info!(
            "Loaded vocabulary with {} words from {} (start={}, end={})",
            vocab.len(),
            path.display(),
            vocab.start_id,
            vocab.end_id
        );
        Ok(vocab)
    }

    /// Parses `word id` lines. Blank lines are ignored, anything else that
    /// does not split into a word and an integer id is rejected.
    pub fn parse(content: &str) -> Result<Self, CaptionError> {
        let mut entries = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            let id = parts
                .next()
                .and_then(|id| id.parse::<TokenId>().ok())
                .ok_or_else(|| {
                    CaptionError::Vocabulary(format!(
                        "line {}: expected `word id`, got {:?}",
                        line_no + 1,
                        line
                    ))
                })?;
            entries.push((line_no + 1, word.to_string(), id));
        }
        Self::from_entries(entries)
    }

    /// Builds a vocabulary whose ids are the positions of `words`.
    pub fn from_words<I, S>(words: I) -> Result<Self, CaptionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_entries(
            words
                .into_iter()
                .enumerate()
                .map(|(id, word)| (id + 1, word.into(), id as TokenId)),
        )
    }

    /// Entries are `(line, word, id)`; the line only feeds error messages.
    fn from_entries<I>(entries: I) -> Result<Self, CaptionError>
    where
        I: IntoIterator<Item = (usize, String, TokenId)>,
    {
        let mut ids = HashMap::new();
        let mut words = HashMap::new();
        for (line, word, id) in entries {
            if id < 0 {
                return Err(CaptionError::Vocabulary(format!(
                    "line {line}: negative id {id} for {word:?}"
                )));
            }
            if ids.contains_key(&word) {
                return Err(CaptionError::Vocabulary(format!(
                    "line {line}: duplicate word {word:?}"
                )));
            }
            if let Some(previous) = words.get(&id) {
                return Err(CaptionError::Vocabulary(format!(
                    "line {line}: id {id} for {word:?} is already taken by {previous:?}"
                )));
            }
            words.insert(id, word.clone());
            ids.insert(word, id);
        }

        if ids.is_empty() {
            return Err(CaptionError::Vocabulary("vocabulary is empty".into()));
        }

        let lookup = |word: &str| ids.get(word).copied();
        let start_id = lookup(START_WORD)
            .ok_or_else(|| CaptionError::Vocabulary(format!("missing {START_WORD} token")))?;
        let end_id = lookup(END_WORD)
            .ok_or_else(|| CaptionError::Vocabulary(format!("missing {END_WORD} token")))?;
        let unknown_id = lookup(UNKNOWN_WORD);

        if start_id == end_id {
            return Err(CaptionError::Vocabulary(
                "start and end tokens share an id".into(),
            ));
        }

        Ok(Self {
            ids,
            words,
            start_id,
            end_id,
            unknown_id,
        })
    }

    pub fn start_id(&self) -> TokenId {
        self.start_id
    }

    pub fn end_id(&self) -> TokenId {
        self.end_id
    }

    pub fn unknown_id(&self) -> Option<TokenId> {
        self.unknown_id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Id for `word`, falling back to the unknown token.
    pub fn id_of(&self, word: &str) -> Option<TokenId> {
        self.ids.get(word).copied().or(self.unknown_id)
    }

    pub fn word(&self, id: TokenId) -> Option<&str> {
        self.words.get(&id).map(String::as_str)
    }

    /// Words of a caption with the leading start and trailing end tokens removed.
    pub fn caption_words(&self, tokens: &[TokenId]) -> Vec<String> {
        let body = match tokens.split_first() {
            Some((&first, rest)) if first == self.start_id => rest,
            _ => tokens,
        };
        let body = match body.split_last() {
            Some((&last, rest)) if last == self.end_id => rest,
            _ => body,
        };
        body.iter()
            .map(|&id| {
                self.word(id)
                    .or_else(|| self.unknown_id.and_then(|unk| self.word(unk)))
                    .unwrap_or(UNKNOWN_WORD)
                    .to_string()
            })
            .collect()
    }

    pub fn render(&self, tokens: &[TokenId]) -> String {
        let joined = self.caption_words(tokens).join(" ");
        match &*PUNCT_SPACE_RE {
            Ok(re) => re.replace_all(&joined, "$1").to_string(),
            Err(_) => joined,
        }
    }
}
