//! Sanitation for stored post HTML.
//!
//! The editor's drag-positioning can leave images with runaway inline
//! `translate()` transforms that push them far outside the page, and some
//! older posts carry images with no layout styles at all. This pass
//! rewrites the stored HTML so every image renders in normal flow:
//! extreme transforms are stripped (keeping any `filter:`, which carries
//! the invert/spoiler effects) and baseline flow styles are filled in.

use regex::{Captures, NoExpand, Regex};
use std::sync::LazyLock;

/// Translate offsets beyond this many pixels are considered runaway.
const MAX_TRANSLATE_PX: f64 = 500.0;

static STYLE_WITH_TRANSFORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"style="([^"]*transform:\s*translate\([-\d.]+px,\s*[-\d.]+px\)[^"]*)""#).unwrap()
});

static TRANSLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"transform:\s*translate\(([-\d.]+)px,\s*([-\d.]+)px\)").unwrap());

static TRANSFORM_PROP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"transform:\s*[^;]+;?").unwrap());

static POSITION_RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"position:\s*relative;?").unwrap());

static FILTER_PROP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"filter:\s*[^;]+").unwrap());

static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img([^>]*)>").unwrap());

static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"style="([^"]*)""#).unwrap());

/// Baseline flow styles every image must end up with.
const REQUIRED_IMG_STYLES: [&str; 7] = [
    "display: block",
    "float: none",
    "clear: both",
    "margin-left: auto",
    "margin-right: auto",
    "max-width: 100%",
    "height: auto",
];

/// Clean up post HTML: drop runaway image transforms and ensure baseline
/// image flow styles. Returns the input unchanged when nothing applies.
pub fn clean_post_html(content: &str) -> String {
    let without_transforms = strip_extreme_transforms(content);
    ensure_image_flow_styles(&without_transforms)
}

/// Remove `transform: translate(x, y)` (and the accompanying
/// `position: relative`) from style attributes whose offsets exceed
/// [`MAX_TRANSLATE_PX`], preserving any `filter:` value.
fn strip_extreme_transforms(content: &str) -> String {
    STYLE_WITH_TRANSFORM
        .replace_all(content, |caps: &Captures| {
            let style = &caps[1];

            let Some(translate) = TRANSLATE.captures(style) else {
                return caps[0].to_string();
            };
            let x: f64 = translate[1].parse().unwrap_or(0.0);
            let y: f64 = translate[2].parse().unwrap_or(0.0);

            if x.abs() <= MAX_TRANSLATE_PX && y.abs() <= MAX_TRANSLATE_PX {
                return caps[0].to_string();
            }

            let mut cleaned = TRANSFORM_PROP.replace_all(style, "").to_string();
            cleaned = POSITION_RELATIVE.replace_all(&cleaned, "").to_string();
            let mut cleaned = normalize_style(&cleaned);

            if let Some(filter) = FILTER_PROP.find(style) {
                if cleaned.is_empty() {
                    cleaned = filter.as_str().to_string();
                } else {
                    cleaned = format!("{cleaned}; {}", filter.as_str());
                }
            }

            if cleaned.is_empty() {
                String::new()
            } else {
                format!(r#"style="{cleaned}""#)
            }
        })
        .into_owned()
}

/// Make sure every `<img>` carries the baseline flow styles, merging with
/// whatever inline style is already present.
fn ensure_image_flow_styles(content: &str) -> String {
    IMG_TAG
        .replace_all(content, |caps: &Captures| {
            let attributes = &caps[1];

            let Some(style_caps) = STYLE_ATTR.captures(attributes) else {
                let defaults = REQUIRED_IMG_STYLES.join("; ");
                return format!(r#"<img{attributes} style="{defaults};">"#);
            };

            let mut style = style_caps[1].to_string();
            for required in REQUIRED_IMG_STYLES {
                let (prop, _) = required.split_once(':').unwrap();
                if !style.contains(&format!("{prop}:")) {
                    style = format!("{style}; {required}");
                }
            }
            let style = normalize_style(&style);

            let replacement = format!(r#"style="{style}""#);
            let attributes = STYLE_ATTR.replace(attributes, NoExpand(&replacement));
            format!("<img{attributes}>")
        })
        .into_owned()
}

/// Collapse doubled semicolons and trim stray separators/whitespace.
fn normalize_style(style: &str) -> String {
    let mut s = style.replace(";;", ";");
    while s.contains(";;") {
        s = s.replace(";;", ";");
    }
    s.trim().trim_matches(';').trim().to_string()
}
