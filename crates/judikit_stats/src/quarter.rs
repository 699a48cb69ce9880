//! Quarter key resolution and file ordering.

use std::sync::OnceLock;

use regex::Regex;

use crate::conf::{C_QUARTER_FILE_NAME_PATTERN, TUP_QUARTER_WORDS};
use crate::spec::{EnumQuarterKeyMode, SpecQuarterKey, StatsError};

static RE_QUARTER_FILE_NAME: OnceLock<Regex> = OnceLock::new();

fn derive_quarter_file_name_regex() -> &'static Regex {
    RE_QUARTER_FILE_NAME.get_or_init(|| {
        Regex::new(C_QUARTER_FILE_NAME_PATTERN).expect("quarter file name pattern is valid")
    })
}

/// Resolve the `(quarter_idx, part_idx)` key of a file name.
///
/// The name must start with `<Word> Trimestre`, optionally followed by `_`
/// and a part number; anything may follow (extension, suffixes). A leading
/// word outside the canonical quarter list is an error in both modes. A name
/// that does not follow the pattern resolves to `(0, 0)` in lenient mode.
pub fn resolve_quarter_key(
    name: &str,
    rule: EnumQuarterKeyMode,
) -> Result<SpecQuarterKey, StatsError> {
    let Some(caps) = derive_quarter_file_name_regex().captures(name) else {
        return match rule {
            EnumQuarterKeyMode::Lenient => Ok(SpecQuarterKey::default()),
            EnumQuarterKeyMode::Strict => Err(StatsError::QuarterPatternMismatch {
                name: name.to_string(),
            }),
        };
    };

    let c_word = &caps[1];
    let quarter_idx = TUP_QUARTER_WORDS
        .iter()
        .position(|w| *w == c_word)
        .ok_or_else(|| StatsError::UnrecognizedQuarter {
            name: name.to_string(),
            word: c_word.to_string(),
        })?;

    let part_idx = match caps.get(2) {
        Some(m) => m
            .as_str()
            .parse::<usize>()
            .map_err(|_| StatsError::QuarterPatternMismatch {
                name: name.to_string(),
            })?,
        None => 0,
    };

    Ok(SpecQuarterKey::new(quarter_idx, part_idx))
}

/// Order file names by quarter key, then by name.
///
/// Fails on the first name the resolver rejects.
pub fn sort_file_names<S: AsRef<str>>(
    names: &[S],
    rule: EnumQuarterKeyMode,
) -> Result<Vec<String>, StatsError> {
    let mut l_keyed = names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            resolve_quarter_key(name, rule).map(|key| (key, name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    l_keyed.sort();
    Ok(l_keyed.into_iter().map(|(_, name)| name).collect())
}
