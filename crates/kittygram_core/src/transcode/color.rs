//! Hex → CSS3 color name lookup.
//!
//! # Invariants
//! - Lookup is exact: no nearest-color matching.
//! - Input hex is normalized (`#rgb` expanded, lowercased) before lookup.
//! - Values with two CSS3 names resolve to one fixed spelling: `gray` over
//!   `grey`, `cyan` over `aqua`, `magenta` over `fuchsia`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MSG_UNKNOWN_COLOR: &str = "no name exists for this color";

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

static NAME_BY_HEX: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CSS3_NAME_BY_HEX.iter().copied().collect());

// One row per distinct value; alias spellings are intentionally absent.
const CSS3_NAME_BY_HEX: &[(&str, &str)] = &[
    ("#f0f8ff", "aliceblue"),
    ("#faebd7", "antiquewhite"),
    ("#7fffd4", "aquamarine"),
    ("#f0ffff", "azure"),
    ("#f5f5dc", "beige"),
    ("#ffe4c4", "bisque"),
    ("#000000", "black"),
    ("#ffebcd", "blanchedalmond"),
    ("#0000ff", "blue"),
    ("#8a2be2", "blueviolet"),
    ("#a52a2a", "brown"),
    ("#deb887", "burlywood"),
    ("#5f9ea0", "cadetblue"),
    ("#7fff00", "chartreuse"),
    ("#d2691e", "chocolate"),
    ("#ff7f50", "coral"),
    ("#6495ed", "cornflowerblue"),
    ("#fff8dc", "cornsilk"),
    ("#dc143c", "crimson"),
    ("#00ffff", "cyan"),
    ("#00008b", "darkblue"),
    ("#008b8b", "darkcyan"),
    ("#b8860b", "darkgoldenrod"),
    ("#a9a9a9", "darkgray"),
    ("#006400", "darkgreen"),
    ("#bdb76b", "darkkhaki"),
    ("#8b008b", "darkmagenta"),
    ("#556b2f", "darkolivegreen"),
    ("#ff8c00", "darkorange"),
    ("#9932cc", "darkorchid"),
    ("#8b0000", "darkred"),
    ("#e9967a", "darksalmon"),
    ("#8fbc8f", "darkseagreen"),
    ("#483d8b", "darkslateblue"),
    ("#2f4f4f", "darkslategray"),
    ("#00ced1", "darkturquoise"),
    ("#9400d3", "darkviolet"),
    ("#ff1493", "deeppink"),
    ("#00bfff", "deepskyblue"),
    ("#696969", "dimgray"),
    ("#1e90ff", "dodgerblue"),
    ("#b22222", "firebrick"),
    ("#fffaf0", "floralwhite"),
    ("#228b22", "forestgreen"),
    ("#dcdcdc", "gainsboro"),
    ("#f8f8ff", "ghostwhite"),
    ("#ffd700", "gold"),
    ("#daa520", "goldenrod"),
    ("#808080", "gray"),
    ("#008000", "green"),
    ("#adff2f", "greenyellow"),
    ("#f0fff0", "honeydew"),
    ("#ff69b4", "hotpink"),
    ("#cd5c5c", "indianred"),
    ("#4b0082", "indigo"),
    ("#fffff0", "ivory"),
    ("#f0e68c", "khaki"),
    ("#e6e6fa", "lavender"),
    ("#fff0f5", "lavenderblush"),
    ("#7cfc00", "lawngreen"),
    ("#fffacd", "lemonchiffon"),
    ("#add8e6", "lightblue"),
    ("#f08080", "lightcoral"),
    ("#e0ffff", "lightcyan"),
    ("#fafad2", "lightgoldenrodyellow"),
    ("#d3d3d3", "lightgray"),
    ("#90ee90", "lightgreen"),
    ("#ffb6c1", "lightpink"),
    ("#ffa07a", "lightsalmon"),
    ("#20b2aa", "lightseagreen"),
    ("#87cefa", "lightskyblue"),
    ("#778899", "lightslategray"),
    ("#b0c4de", "lightsteelblue"),
    ("#ffffe0", "lightyellow"),
    ("#00ff00", "lime"),
    ("#32cd32", "limegreen"),
    ("#faf0e6", "linen"),
    ("#ff00ff", "magenta"),
    ("#800000", "maroon"),
    ("#66cdaa", "mediumaquamarine"),
    ("#0000cd", "mediumblue"),
    ("#ba55d3", "mediumorchid"),
    ("#9370db", "mediumpurple"),
    ("#3cb371", "mediumseagreen"),
    ("#7b68ee", "mediumslateblue"),
    ("#00fa9a", "mediumspringgreen"),
    ("#48d1cc", "mediumturquoise"),
    ("#c71585", "mediumvioletred"),
    ("#191970", "midnightblue"),
    ("#f5fffa", "mintcream"),
    ("#ffe4e1", "mistyrose"),
    ("#ffe4b5", "moccasin"),
    ("#ffdead", "navajowhite"),
    ("#000080", "navy"),
    ("#fdf5e6", "oldlace"),
    ("#808000", "olive"),
    ("#6b8e23", "olivedrab"),
    ("#ffa500", "orange"),
    ("#ff4500", "orangered"),
    ("#da70d6", "orchid"),
    ("#eee8aa", "palegoldenrod"),
    ("#98fb98", "palegreen"),
    ("#afeeee", "paleturquoise"),
    ("#db7093", "palevioletred"),
    ("#ffefd5", "papayawhip"),
    ("#ffdab9", "peachpuff"),
    ("#cd853f", "peru"),
    ("#ffc0cb", "pink"),
    ("#dda0dd", "plum"),
    ("#b0e0e6", "powderblue"),
    ("#800080", "purple"),
    ("#ff0000", "red"),
    ("#bc8f8f", "rosybrown"),
    ("#4169e1", "royalblue"),
    ("#8b4513", "saddlebrown"),
    ("#fa8072", "salmon"),
    ("#f4a460", "sandybrown"),
    ("#2e8b57", "seagreen"),
    ("#fff5ee", "seashell"),
    ("#a0522d", "sienna"),
    ("#c0c0c0", "silver"),
    ("#87ceeb", "skyblue"),
    ("#6a5acd", "slateblue"),
    ("#708090", "slategray"),
    ("#fffafa", "snow"),
    ("#00ff7f", "springgreen"),
    ("#4682b4", "steelblue"),
    ("#d2b48c", "tan"),
    ("#008080", "teal"),
    ("#d8bfd8", "thistle"),
    ("#ff6347", "tomato"),
    ("#40e0d0", "turquoise"),
    ("#ee82ee", "violet"),
    ("#f5deb3", "wheat"),
    ("#ffffff", "white"),
    ("#f5f5f5", "whitesmoke"),
    ("#ffff00", "yellow"),
    ("#9acd32", "yellowgreen"),
];

/// Input could not be mapped to a color name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColor {
    pub input: String,
}

impl Display for UnknownColor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{MSG_UNKNOWN_COLOR}")
    }
}

impl Error for UnknownColor {}

/// Normalizes `#rgb` / `#rrggbb` to lowercase `#rrggbb`.
///
/// Returns `None` for anything else, including a missing `#`.
pub fn normalize_hex(value: &str) -> Option<String> {
    if !HEX_COLOR_RE.is_match(value) {
        return None;
    }
    let digits = &value[1..];
    let expanded = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect::<String>()
    } else {
        digits.to_string()
    };
    Some(format!("#{}", expanded.to_ascii_lowercase()))
}

/// Converts a wire hex color into its stored name.
pub fn hex_to_name(value: &str) -> Result<&'static str, UnknownColor> {
    normalize_hex(value)
        .and_then(|hex| NAME_BY_HEX.get(hex.as_str()).copied())
        .ok_or_else(|| UnknownColor {
            input: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::{hex_to_name, normalize_hex, CSS3_NAME_BY_HEX, MSG_UNKNOWN_COLOR};
    use std::collections::HashSet;

    #[test]
    fn known_values_map_to_exact_names() {
        assert_eq!(hex_to_name("#ff0000"), Ok("red"));
        assert_eq!(hex_to_name("#FFFFFF"), Ok("white"));
        assert_eq!(hex_to_name("#000"), Ok("black"));
        let err = hex_to_name("#663399").unwrap_err();
        assert_eq!(err.to_string(), MSG_UNKNOWN_COLOR);
        assert_eq!(err.input, "#663399");
    }

    #[test]
    fn alias_values_resolve_to_fixed_spelling() {
        assert_eq!(hex_to_name("#808080"), Ok("gray"));
        assert_eq!(hex_to_name("#a9a9a9"), Ok("darkgray"));
        assert_eq!(hex_to_name("#00ffff"), Ok("cyan"));
        assert_eq!(hex_to_name("#ff00ff"), Ok("magenta"));
    }

    #[test]
    fn near_miss_and_malformed_values_are_rejected() {
        assert!(hex_to_name("#fe0000").is_err());
        assert!(hex_to_name("ff0000").is_err());
        assert!(hex_to_name("#ff00").is_err());
        assert!(hex_to_name("red").is_err());
        assert!(hex_to_name(" #ff0000 ").is_err());
    }

    #[test]
    fn normalize_expands_short_form() {
        assert_eq!(normalize_hex("#AbC").as_deref(), Some("#aabbcc"));
        assert_eq!(normalize_hex("#12345g"), None);
    }

    #[test]
    fn table_has_unique_values() {
        let unique = CSS3_NAME_BY_HEX
            .iter()
            .map(|(hex, _)| *hex)
            .collect::<HashSet<_>>();
        assert_eq!(unique.len(), CSS3_NAME_BY_HEX.len());
        assert_eq!(CSS3_NAME_BY_HEX.len(), 138);
    }
}
