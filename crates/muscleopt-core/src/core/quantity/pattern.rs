use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Characters considered noise when they surround the substantive part of a filter.
const WILDCARD_METACHARACTERS: [char; 3] = ['*', '+', '?'];

/// The canonical "any-length" token, also the pattern that shows every name.
pub const MATCH_ANYTHING: &str = ".*";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Invalid filter pattern '{pattern}': {message}")]
    Invalid { pattern: String, message: String },
}

/// A filter expression ready to be matched against whole names.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    fn from_source(source: String) -> Result<Self, PatternError> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|e| PatternError::Invalid {
            pattern: source.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { source, regex })
    }

    pub fn match_anything() -> Self {
        Self::from_source(MATCH_ANYTHING.to_string())
            .unwrap_or_else(|_| unreachable!("'.*' is a valid expression"))
    }

    /// Builds a matcher accepting exactly the given names and nothing else.
    pub fn exact_members<I, S>(members: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = members
            .into_iter()
            .map(|member| regex::escape(member.as_ref()))
            .collect();
        if alternatives.is_empty() {
            // `[^\s\S]` never matches, so an empty group shows nothing.
            return Self::from_source(r"[^\s\S]".to_string());
        }
        Self::from_source(alternatives.join("|"))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match_anything(&self) -> bool {
        self.source == MATCH_ANYTHING
    }

    pub fn matches(&self, name: &str) -> bool {
        self.is_match_anything() || self.regex.is_match(name)
    }
}

impl PartialEq for CompiledPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for CompiledPattern {}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Expands raw user text into the normalized "contains anywhere" expression.
///
/// Leading and trailing `*`, `+` and `?` are stripped, the remainder is wrapped in
/// [`MATCH_ANYTHING`] and shorthand wildcards are rewritten to `.*` / `.?`. Text that
/// strips down to nothing expands to [`MATCH_ANYTHING`]. Expanding an already expanded
/// expression returns it unchanged.
pub fn expand(raw: &str) -> String {
    let core = strip_wildcard_noise(raw.trim());
    if core.is_empty() {
        return MATCH_ANYTHING.to_string();
    }

    // Alternatives are grouped and always wrapped so every branch matches anywhere.
    if has_top_level_alternation(core) {
        return normalize(&format!("{MATCH_ANYTHING}(?:{core}){MATCH_ANYTHING}"));
    }

    let needs_prefix = !core.starts_with(MATCH_ANYTHING);
    let needs_suffix = !core.ends_with(MATCH_ANYTHING);
    if !needs_prefix && !needs_suffix {
        return normalize(core);
    }

    let mut wrapped = String::with_capacity(core.len() + 2 * MATCH_ANYTHING.len());
    if needs_prefix {
        wrapped.push_str(MATCH_ANYTHING);
    }
    wrapped.push_str(core);
    if needs_suffix {
        wrapped.push_str(MATCH_ANYTHING);
    }
    normalize(&wrapped)
}

/// Rewrites bare `*` to `.*` and bare `?` to `.?`.
///
/// Escaped characters and the `(?` group prefix are left alone.
pub fn normalize(pattern: &str) -> String {
    let mut normalized = String::with_capacity(pattern.len() + 8);
    let mut previous = None;
    for c in pattern.chars() {
        let bare = match c {
            '*' => !matches!(previous, Some('.') | Some('\\')),
            '?' => !matches!(previous, Some('.') | Some('\\') | Some('(')),
            _ => false,
        };
        if bare {
            normalized.push('.');
        }
        normalized.push(c);
        previous = Some(c);
    }
    normalized
}

/// Expands and compiles user text.
pub fn compile(raw: &str) -> Result<CompiledPattern, PatternError> {
    CompiledPattern::from_source(expand(raw))
}

/// True when `|` splits the expression outside any group or character class.
fn has_top_level_alternation(expression: &str) -> bool {
    let mut depth = 0usize;
    let mut in_class = false;
    let mut escaped = false;
    for c in expression.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => depth = depth.saturating_sub(1),
            '|' if !in_class && depth == 0 => return true,
            _ => {}
        }
    }
    false
}

fn strip_wildcard_noise(text: &str) -> &str {
    let mut core = text.trim_start_matches(WILDCARD_METACHARACTERS);
    while let Some(last) = core.chars().last() {
        if !WILDCARD_METACHARACTERS.contains(&last) {
            break;
        }
        let head = &core[..core.len() - last.len_utf8()];
        // The quantifier of a canonical `.*` / `.?` / `.+` token is not noise.
        if head.ends_with('.') {
            break;
        }
        core = head;
    }
    core
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_strips_noise_and_wraps_for_substring_matching() {
        assert_eq!(expand("hip*"), ".*hip.*");
        assert_eq!(expand("**+?knee?+*"), ".*knee.*");
        assert_eq!(expand("  ankle "), ".*ankle.*");
    }

    #[test]
    fn expand_normalizes_inner_shorthand_wildcards() {
        assert_eq!(expand("hip*flex"), ".*hip.*flex.*");
        assert_eq!(expand("r?ght"), ".*r.?ght.*");
    }

    #[test]
    fn expand_of_blank_or_pure_noise_matches_anything() {
        assert_eq!(expand(""), MATCH_ANYTHING);
        assert_eq!(expand("*?+"), MATCH_ANYTHING);
        assert_eq!(expand(".*"), MATCH_ANYTHING);
    }

    #[test]
    fn expand_is_idempotent() {
        for raw in ["hip*", "*glut*med?", ".*", "", "a|b", "hip.*", ".", "x.?", "(?:a)",
            "hip|knee.*", ".*hip|knee.*", "[|]x"] {
            let once = expand(raw);
            assert_eq!(expand(&once), once, "expanding '{raw}' twice changed it");
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn compiling_an_expanded_pattern_yields_the_same_compiled_form() {
        let first = compile("glut*").unwrap();
        let second = compile(first.as_str()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.as_str(), ".*glut.*");
    }

    #[test]
    fn compiled_pattern_matches_substrings_of_whole_names() {
        let pattern = compile("hip*").unwrap();
        assert!(pattern.matches("hip_flexion_r"));
        assert!(pattern.matches("r_hip_rotation"));
        assert!(!pattern.matches("knee_angle"));
    }

    #[test]
    fn alternation_is_grouped_before_wrapping() {
        assert_eq!(expand("hip|knee"), ".*(?:hip|knee).*");
        assert_eq!(expand("hip|knee.*"), ".*(?:hip|knee.*).*");
        assert_eq!(expand(".*hip|knee.*"), ".*(?:.*hip|knee.*).*");
    }

    #[test]
    fn alternation_inside_a_group_or_class_is_not_split() {
        assert_eq!(expand("(?:hip|knee)"), ".*(?:hip|knee).*");
        assert_eq!(expand("[|]x"), ".*[|]x.*");
    }

    #[test]
    fn alternation_is_supported() {
        let pattern = compile("hip|knee").unwrap();
        assert!(pattern.matches("knee_angle_r"));
        assert!(pattern.matches("hip_adduction_l"));
        assert!(!pattern.matches("ankle_angle_r"));

        let trailing_wildcard = compile("hip|knee.*").unwrap();
        assert!(trailing_wildcard.matches("hip_flexion_r"));
        assert!(trailing_wildcard.matches("r_knee_angle"));
        assert!(!trailing_wildcard.matches("ankle_angle_r"));
    }

    #[test]
    fn syntactically_invalid_text_is_rejected() {
        let result = compile("hip(");
        assert!(matches!(result, Err(PatternError::Invalid { .. })));
    }

    #[test]
    fn exact_members_matches_only_listed_names() {
        let matcher = CompiledPattern::exact_members(["glut_med1_r", "psoas.r"]).unwrap();
        assert!(matcher.matches("glut_med1_r"));
        assert!(matcher.matches("psoas.r"));
        assert!(!matcher.matches("psoasXr"));
        assert!(!matcher.matches("glut_med1_r_extra"));
    }

    #[test]
    fn exact_members_of_empty_group_matches_nothing() {
        let matcher = CompiledPattern::exact_members(Vec::<String>::new()).unwrap();
        assert!(!matcher.matches("anything"));
        assert!(!matcher.matches(""));
    }
}
