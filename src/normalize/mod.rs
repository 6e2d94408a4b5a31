//! Correction pass for recognized text.
//!
//! Engine output for scanned course material carries systematic error
//! classes: character-level splits ("4 2" for "42"), glyph confusions
//! ("(l)" for "(1)", space-flanked "--" for "="), and inconsistent list
//! markers. This module runs a fixed sequence of rewrite rules over the
//! raw text. Order is load-bearing: later rules assume earlier ones have
//! already tightened whitespace and corrected symbol classes.
//!
//! Every rule is a pure string-to-string function and the whole pass is
//! deterministic and idempotent.

use std::sync::OnceLock;

use regex::Regex;

/// A single named rewrite applied during normalization.
struct Rule {
    name: &'static str,
    apply: fn(&str) -> String,
}

const RULES: &[Rule] = &[
    Rule {
        name: "join-split-alphanumerics",
        apply: join_split_alphanumerics,
    },
    Rule {
        name: "tighten-exponent-markers",
        apply: tighten_exponent_markers,
    },
    Rule {
        name: "correct-symbol-glyphs",
        apply: correct_symbol_glyphs,
    },
    Rule {
        name: "normalize-list-markers",
        apply: normalize_list_markers,
    },
    Rule {
        name: "normalize-operator-spacing",
        apply: normalize_operator_spacing,
    },
    Rule {
        name: "collapse-blank-lines",
        apply: collapse_blank_lines,
    },
];

/// Apply the full correction pass to raw recognized text.
pub fn normalize(raw: &str) -> String {
    RULES.iter().fold(raw.to_string(), |text, rule| {
        let fixed = fixpoint(rule.apply, &text);
        if fixed != text {
            tracing::trace!(rule = rule.name, "rewrite applied");
        }
        fixed
    })
}

/// Re-apply a rule until its output stops changing.
///
/// Regex replacement is non-overlapping, so chained corrections ("1 2 3")
/// need more than one pass. The iteration cap bounds pathological input;
/// real corrections settle in two or three passes.
fn fixpoint(apply: fn(&str) -> String, input: &str) -> String {
    let mut current = input.to_string();
    for _ in 0..8 {
        let next = apply(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn cached(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

/// Rejoin alphanumerics split by a stray space: digit-digit pairs and a
/// standalone letter next to a digit ("x 2", "4 x", but not "chapter 2").
fn join_split_alphanumerics(text: &str) -> String {
    static DIGIT_DIGIT: OnceLock<Regex> = OnceLock::new();
    static LETTER_DIGIT: OnceLock<Regex> = OnceLock::new();
    static DIGIT_LETTER: OnceLock<Regex> = OnceLock::new();

    let text = cached(&DIGIT_DIGIT, r"(\d) (\d)").replace_all(text, "${1}${2}");
    let text = cached(&LETTER_DIGIT, r"\b([A-Za-z]) (\d)").replace_all(&text, "${1}${2}");
    cached(&DIGIT_LETTER, r"(\d) ([A-Za-z])\b")
        .replace_all(&text, "${1}${2}")
        .into_owned()
}

/// Pull exponent and subscript markers tight against their operands.
fn tighten_exponent_markers(text: &str) -> String {
    static EXPONENT: OnceLock<Regex> = OnceLock::new();
    static SUBSCRIPT: OnceLock<Regex> = OnceLock::new();

    let text = cached(&EXPONENT, r"(\w)[ \t]*\^[ \t]*(\w)").replace_all(text, "${1}^${2}");
    cached(&SUBSCRIPT, r"(\w)[ \t]*_[ \t]*(\w)")
        .replace_all(&text, "${1}_${2}")
        .into_owned()
}

/// Fix glyphs the engine reliably confuses in mathematical text.
fn correct_symbol_glyphs(text: &str) -> String {
    static BROKEN_ROOT: OnceLock<Regex> = OnceLock::new();
    static DOUBLE_DASH: OnceLock<Regex> = OnceLock::new();
    static SQRT_WORD: OnceLock<Regex> = OnceLock::new();
    static PI_WORD: OnceLock<Regex> = OnceLock::new();
    static PAREN_GLYPH: OnceLock<Regex> = OnceLock::new();

    let text = cached(&BROKEN_ROOT, r"[|¦]-").replace_all(text, "\u{221a}");
    let text = cached(&DOUBLE_DASH, r"(\s)--(\s)").replace_all(&text, "${1}=${2}");
    let text = cached(&SQRT_WORD, r"\bsqrt\b").replace_all(&text, "\u{221a}");
    let text = cached(&PI_WORD, r"\bpi\b").replace_all(&text, "\u{3c0}");

    // Single ambiguous glyphs inside parenthesized list markers.
    cached(&PAREN_GLYPH, r"\(([lZzOoSs])\)")
        .replace_all(&text, |caps: &regex::Captures| {
            let digit = match &caps[1] {
                "l" => "1",
                "Z" | "z" => "2",
                "O" | "o" => "0",
                _ => "5",
            };
            format!("({digit})")
        })
        .into_owned()
}

const ROMAN_MARKERS: &[&str] = &["i", "ii", "iii", "iv", "v", "vi", "vii", "viii"];

/// Canonicalize Roman-numeral list markers.
///
/// Parenthesized numerals drop to lowercase; a numeral opening a line with a
/// trailing period becomes the `i)` marker form. The bare-space form is only
/// rewritten for multi-letter numerals, so prose lines starting with "i" or
/// "v" stay prose.
fn normalize_list_markers(text: &str) -> String {
    static PAREN_ROMAN: OnceLock<Regex> = OnceLock::new();
    static LINE_START_DOT: OnceLock<Regex> = OnceLock::new();
    static LINE_START_SPACE: OnceLock<Regex> = OnceLock::new();

    let text = cached(&PAREN_ROMAN, r"\(([IVX]{1,4})\)").replace_all(text, |caps: &regex::Captures| {
        let lower = caps[1].to_ascii_lowercase();
        if ROMAN_MARKERS.contains(&lower.as_str()) {
            format!("({lower})")
        } else {
            caps[0].to_string()
        }
    });

    let text = cached(
        &LINE_START_DOT,
        r"(?m)^([ \t]*)(viii|vii|vi|v|iv|iii|ii|i)\.[ \t]+",
    )
    .replace_all(&text, "${1}${2}) ");

    cached(
        &LINE_START_SPACE,
        r"(?m)^([ \t]*)(viii|vii|vi|iv|iii|ii)[ \t]+",
    )
    .replace_all(&text, "${1}${2}) ")
    .into_owned()
}

/// Give binary `+`/`-` exactly one space per side and close the gap in
/// single-letter call syntax ("f (x)").
///
/// A dash only counts as binary when already space-flanked; hyphenated words
/// and negative numbers pass through untouched. The call rule skips "a",
/// "A", and "I" so ordinary prose parentheticals survive.
fn normalize_operator_spacing(text: &str) -> String {
    static PLUS: OnceLock<Regex> = OnceLock::new();
    static MINUS: OnceLock<Regex> = OnceLock::new();
    static CALL: OnceLock<Regex> = OnceLock::new();

    let text = cached(&PLUS, r"([\w)])[ \t]*\+[ \t]*([\w(])").replace_all(text, "${1} + ${2}");
    let text = cached(&MINUS, r"(\S)[ \t]+-[ \t]+(\S)").replace_all(&text, "${1} - ${2}");
    cached(&CALL, r"\b([b-zB-HJ-Z])[ \t]+\(")
        .replace_all(&text, "${1}(")
        .into_owned()
}

/// Collapse runs of three or more newlines to a single blank line.
fn collapse_blank_lines(text: &str) -> String {
    static BLANKS: OnceLock<Regex> = OnceLock::new();
    cached(&BLANKS, r"\n{3,}").replace_all(text, "\n\n").into_owned()
}
