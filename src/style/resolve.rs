//! Style declaration -> taffy Style conversion.
//!
//! Maps the camelCase layout declarations of a [`StyleSheet`] to taffy's
//! layout types ([`taffy::Style`], [`Dimension`], [`LengthPercentageAuto`],
//! etc.). Bare numbers are device pixels, `"50%"` strings are percentages,
//! `"auto"` is auto where the slot allows it. Unrecognized values fall back
//! to the slot's default with a warning; layout never fails.

use serde_json::Value;
use taffy::prelude::*;
use tracing::warn;

use super::sheet::StyleSheet;

// ---------------------------------------------------------------------------
// Scalar resolvers
// ---------------------------------------------------------------------------

/// Resolve a declaration value to a [`Dimension`] for sizing contexts
/// (width, height, min/max, flexBasis).
pub fn resolve_dimension(key: &str, value: &Value) -> Dimension {
    match parsed_scalar(value) {
        Some(Scalar::Length(px)) => Dimension::from_length(px),
        Some(Scalar::Percent(fraction)) => Dimension::from_percent(fraction),
        Some(Scalar::Auto) => Dimension::AUTO,
        None => {
            warn!(key, %value, "invalid dimension, using auto");
            Dimension::AUTO
        }
    }
}

/// Resolve a declaration value to a [`LengthPercentageAuto`] for margin and
/// inset contexts.
pub fn resolve_lpa(key: &str, value: &Value) -> LengthPercentageAuto {
    match parsed_scalar(value) {
        Some(Scalar::Length(px)) => LengthPercentageAuto::from_length(px),
        Some(Scalar::Percent(fraction)) => LengthPercentageAuto::from_percent(fraction),
        Some(Scalar::Auto) => LengthPercentageAuto::AUTO,
        None => {
            warn!(key, %value, "invalid length, using auto");
            LengthPercentageAuto::AUTO
        }
    }
}

/// Resolve a declaration value to a [`LengthPercentage`] for contexts that
/// do not allow auto (padding, border, gap). Auto maps to zero.
pub fn resolve_lp(key: &str, value: &Value) -> LengthPercentage {
    match parsed_scalar(value) {
        Some(Scalar::Length(px)) => LengthPercentage::from_length(px),
        Some(Scalar::Percent(fraction)) => LengthPercentage::from_percent(fraction),
        Some(Scalar::Auto) => LengthPercentage::ZERO,
        None => {
            warn!(key, %value, "invalid length, using zero");
            LengthPercentage::ZERO
        }
    }
}

enum Scalar {
    Length(f32),
    /// Fraction in 0..1 (the wire carries 0..100).
    Percent(f32),
    Auto,
}

fn parsed_scalar(value: &Value) -> Option<Scalar> {
    match value {
        Value::Number(n) => n.as_f64().map(|px| Scalar::Length(px as f32)),
        Value::String(s) if s == "auto" => Some(Scalar::Auto),
        Value::String(s) => {
            if let Some(percent) = s.strip_suffix('%') {
                percent.trim().parse::<f32>().ok().map(|p| Scalar::Percent(p / 100.0))
            } else {
                s.trim().parse::<f32>().ok().map(Scalar::Length)
            }
        }
        _ => None,
    }
}

fn resolve_number(key: &str, value: &Value) -> Option<f32> {
    match value.as_f64() {
        Some(n) => Some(n as f32),
        None => {
            warn!(key, %value, "expected a number");
            None
        }
    }
}

fn str_value<'v>(key: &str, value: &'v Value) -> Option<&'v str> {
    match value.as_str() {
        Some(s) => Some(s),
        None => {
            warn!(key, %value, "expected a keyword string");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword resolvers
// ---------------------------------------------------------------------------

fn resolve_flex_direction(value: &str) -> Option<FlexDirection> {
    match value {
        "row" => Some(FlexDirection::Row),
        "row-reverse" => Some(FlexDirection::RowReverse),
        "column" => Some(FlexDirection::Column),
        "column-reverse" => Some(FlexDirection::ColumnReverse),
        _ => None,
    }
}

fn resolve_flex_wrap(value: &str) -> Option<FlexWrap> {
    match value {
        "nowrap" => Some(FlexWrap::NoWrap),
        "wrap" => Some(FlexWrap::Wrap),
        "wrap-reverse" => Some(FlexWrap::WrapReverse),
        _ => None,
    }
}

fn resolve_align_content(value: &str) -> Option<AlignContent> {
    match value {
        "flex-start" => Some(AlignContent::FlexStart),
        "flex-end" => Some(AlignContent::FlexEnd),
        "center" => Some(AlignContent::Center),
        "stretch" => Some(AlignContent::Stretch),
        "space-between" => Some(AlignContent::SpaceBetween),
        "space-around" => Some(AlignContent::SpaceAround),
        "space-evenly" => Some(AlignContent::SpaceEvenly),
        _ => None,
    }
}

fn resolve_align_items(value: &str) -> Option<AlignItems> {
    match value {
        "flex-start" => Some(AlignItems::FlexStart),
        "flex-end" => Some(AlignItems::FlexEnd),
        "center" => Some(AlignItems::Center),
        "baseline" => Some(AlignItems::Baseline),
        "stretch" => Some(AlignItems::Stretch),
        _ => None,
    }
}

fn resolve_overflow(value: &str) -> Option<taffy::style::Overflow> {
    match value {
        "visible" => Some(taffy::style::Overflow::Visible),
        "hidden" => Some(taffy::style::Overflow::Hidden),
        "scroll" | "auto" => Some(taffy::style::Overflow::Scroll),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Sheet resolution
// ---------------------------------------------------------------------------

/// Convert a view's merged [`StyleSheet`] into a [`taffy::Style`].
///
/// Every view is a flex container, column by default. Declarations apply in
/// key order (the sheet is sorted), so the `margin`/`padding` shorthands
/// land before their side-specific overrides.
pub fn resolve_sheet(sheet: &StyleSheet) -> taffy::Style {
    let mut style = taffy::Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        ..Default::default()
    };

    for (key, value) in sheet.declarations() {
        apply_declaration(&mut style, key, value);
    }

    style
}

fn apply_declaration(style: &mut taffy::Style, key: &str, value: &Value) {
    match key {
        "width" => style.size.width = resolve_dimension(key, value),
        "height" => style.size.height = resolve_dimension(key, value),
        "minWidth" => style.min_size.width = resolve_dimension(key, value),
        "minHeight" => style.min_size.height = resolve_dimension(key, value),
        "maxWidth" => style.max_size.width = resolve_dimension(key, value),
        "maxHeight" => style.max_size.height = resolve_dimension(key, value),

        // flex: n is the grow/shrink/basis shorthand.
        "flex" => {
            if let Some(flex) = resolve_number(key, value) {
                if flex > 0.0 {
                    style.flex_grow = flex;
                    style.flex_shrink = 1.0;
                    style.flex_basis = Dimension::from_percent(0.0);
                } else {
                    style.flex_grow = 0.0;
                    style.flex_shrink = if flex < 0.0 { 1.0 } else { 0.0 };
                    style.flex_basis = Dimension::AUTO;
                }
            }
        }
        "flexGrow" => {
            if let Some(grow) = resolve_number(key, value) {
                style.flex_grow = grow;
            }
        }
        "flexShrink" => {
            if let Some(shrink) = resolve_number(key, value) {
                style.flex_shrink = shrink;
            }
        }
        "flexBasis" => style.flex_basis = resolve_dimension(key, value),
        "flexDirection" => {
            if let Some(direction) = str_value(key, value).and_then(resolve_flex_direction) {
                style.flex_direction = direction;
            } else {
                warn!(key, %value, "unknown flex direction");
            }
        }
        "flexWrap" => {
            if let Some(wrap) = str_value(key, value).and_then(resolve_flex_wrap) {
                style.flex_wrap = wrap;
            } else {
                warn!(key, %value, "unknown flex wrap");
            }
        }

        "justifyContent" => {
            style.justify_content = str_value(key, value).and_then(resolve_align_content);
        }
        "alignItems" => {
            style.align_items = str_value(key, value).and_then(resolve_align_items);
        }
        "alignSelf" => {
            // "auto" inherits from the parent's alignItems, i.e. unset.
            style.align_self = str_value(key, value)
                .filter(|s| *s != "auto")
                .and_then(resolve_align_items);
        }
        "alignContent" => {
            style.align_content = str_value(key, value).and_then(resolve_align_content);
        }

        "margin" => style.margin = uniform_rect_lpa(key, value),
        "marginTop" => style.margin.top = resolve_lpa(key, value),
        "marginRight" => style.margin.right = resolve_lpa(key, value),
        "marginBottom" => style.margin.bottom = resolve_lpa(key, value),
        "marginLeft" => style.margin.left = resolve_lpa(key, value),
        "marginHorizontal" => {
            let resolved = resolve_lpa(key, value);
            style.margin.left = resolved;
            style.margin.right = resolved;
        }
        "marginVertical" => {
            let resolved = resolve_lpa(key, value);
            style.margin.top = resolved;
            style.margin.bottom = resolved;
        }

        "padding" => style.padding = uniform_rect_lp(key, value),
        "paddingTop" => style.padding.top = resolve_lp(key, value),
        "paddingRight" => style.padding.right = resolve_lp(key, value),
        "paddingBottom" => style.padding.bottom = resolve_lp(key, value),
        "paddingLeft" => style.padding.left = resolve_lp(key, value),
        "paddingHorizontal" => {
            let resolved = resolve_lp(key, value);
            style.padding.left = resolved;
            style.padding.right = resolved;
        }
        "paddingVertical" => {
            let resolved = resolve_lp(key, value);
            style.padding.top = resolved;
            style.padding.bottom = resolved;
        }

        "borderWidth" => style.border = uniform_rect_lp(key, value),
        "borderTopWidth" => style.border.top = resolve_lp(key, value),
        "borderRightWidth" => style.border.right = resolve_lp(key, value),
        "borderBottomWidth" => style.border.bottom = resolve_lp(key, value),
        "borderLeftWidth" => style.border.left = resolve_lp(key, value),

        "position" => match str_value(key, value) {
            Some("absolute") => style.position = Position::Absolute,
            Some("relative") => style.position = Position::Relative,
            _ => warn!(key, %value, "unknown position"),
        },
        "top" => style.inset.top = resolve_lpa(key, value),
        "right" => style.inset.right = resolve_lpa(key, value),
        "bottom" => style.inset.bottom = resolve_lpa(key, value),
        "left" => style.inset.left = resolve_lpa(key, value),

        "display" => match str_value(key, value) {
            Some("none") => style.display = Display::None,
            Some("flex") => style.display = Display::Flex,
            _ => warn!(key, %value, "unknown display"),
        },
        "overflow" => {
            if let Some(overflow) = str_value(key, value).and_then(resolve_overflow) {
                style.overflow = taffy::geometry::Point { x: overflow, y: overflow };
            } else {
                warn!(key, %value, "unknown overflow");
            }
        }

        "gap" => {
            let resolved = resolve_lp(key, value);
            style.gap = taffy::geometry::Size { width: resolved, height: resolved };
        }
        "rowGap" => style.gap.height = resolve_lp(key, value),
        "columnGap" => style.gap.width = resolve_lp(key, value),
        "aspectRatio" => style.aspect_ratio = resolve_number(key, value),

        // Paint keys never reach here; the sheet's delta routes them to the
        // native view instead.
        _ => {}
    }
}

fn uniform_rect_lpa(key: &str, value: &Value) -> taffy::geometry::Rect<LengthPercentageAuto> {
    let resolved = resolve_lpa(key, value);
    taffy::geometry::Rect { top: resolved, right: resolved, bottom: resolved, left: resolved }
}

fn uniform_rect_lp(key: &str, value: &Value) -> taffy::geometry::Rect<LengthPercentage> {
    let resolved = resolve_lp(key, value);
    taffy::geometry::Rect { top: resolved, right: resolved, bottom: resolved, left: resolved }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn sheet_of(pairs: &[(&str, Value)]) -> StyleSheet {
        let patch: Map<String, Value> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        let mut sheet = StyleSheet::new();
        sheet.merge(&patch);
        sheet
    }

    // -----------------------------------------------------------------------
    // Scalar resolvers
    // -----------------------------------------------------------------------

    #[test]
    fn dimension_from_number() {
        assert_eq!(resolve_dimension("width", &json!(120)), Dimension::from_length(120.0));
        assert_eq!(resolve_dimension("width", &json!(12.5)), Dimension::from_length(12.5));
    }

    #[test]
    fn dimension_from_percent_string() {
        assert_eq!(resolve_dimension("width", &json!("50%")), Dimension::from_percent(0.5));
        assert_eq!(resolve_dimension("width", &json!("100%")), Dimension::from_percent(1.0));
    }

    #[test]
    fn dimension_auto_and_numeric_string() {
        assert_eq!(resolve_dimension("width", &json!("auto")), Dimension::AUTO);
        assert_eq!(resolve_dimension("width", &json!("33")), Dimension::from_length(33.0));
    }

    #[test]
    fn dimension_garbage_falls_back_to_auto() {
        assert_eq!(resolve_dimension("width", &json!("wide")), Dimension::AUTO);
        assert_eq!(resolve_dimension("width", &json!(true)), Dimension::AUTO);
        assert_eq!(resolve_dimension("width", &json!({})), Dimension::AUTO);
    }

    #[test]
    fn lp_has_no_auto() {
        assert_eq!(resolve_lp("padding", &json!("auto")), LengthPercentage::ZERO);
        assert_eq!(resolve_lp("padding", &json!(4)), LengthPercentage::from_length(4.0));
        assert_eq!(resolve_lp("padding", &json!("25%")), LengthPercentage::from_percent(0.25));
    }

    #[test]
    fn lpa_keeps_auto() {
        assert_eq!(resolve_lpa("margin", &json!("auto")), LengthPercentageAuto::AUTO);
        assert_eq!(resolve_lpa("margin", &json!(8)), LengthPercentageAuto::from_length(8.0));
    }

    // -----------------------------------------------------------------------
    // resolve_sheet
    // -----------------------------------------------------------------------

    #[test]
    fn default_is_flex_column() {
        let style = resolve_sheet(&StyleSheet::new());
        assert_eq!(style.display, Display::Flex);
        assert_eq!(style.flex_direction, FlexDirection::Column);
    }

    #[test]
    fn direction_keywords() {
        let style = resolve_sheet(&sheet_of(&[("flexDirection", json!("row"))]));
        assert_eq!(style.flex_direction, FlexDirection::Row);

        let style = resolve_sheet(&sheet_of(&[("flexDirection", json!("row-reverse"))]));
        assert_eq!(style.flex_direction, FlexDirection::RowReverse);

        // Unknown keyword keeps the column default.
        let style = resolve_sheet(&sheet_of(&[("flexDirection", json!("diagonal"))]));
        assert_eq!(style.flex_direction, FlexDirection::Column);
    }

    #[test]
    fn flex_shorthand_expands() {
        let style = resolve_sheet(&sheet_of(&[("flex", json!(2))]));
        assert_eq!(style.flex_grow, 2.0);
        assert_eq!(style.flex_shrink, 1.0);
        assert_eq!(style.flex_basis, Dimension::from_percent(0.0));

        let style = resolve_sheet(&sheet_of(&[("flex", json!(0))]));
        assert_eq!(style.flex_grow, 0.0);
        assert_eq!(style.flex_shrink, 0.0);
        assert_eq!(style.flex_basis, Dimension::AUTO);
    }

    #[test]
    fn alignment_keywords() {
        let style = resolve_sheet(&sheet_of(&[
            ("justifyContent", json!("space-between")),
            ("alignItems", json!("center")),
            ("alignSelf", json!("flex-end")),
        ]));
        assert_eq!(style.justify_content, Some(AlignContent::SpaceBetween));
        assert_eq!(style.align_items, Some(AlignItems::Center));
        assert_eq!(style.align_self, Some(AlignItems::FlexEnd));
    }

    #[test]
    fn align_self_auto_is_unset() {
        let style = resolve_sheet(&sheet_of(&[("alignSelf", json!("auto"))]));
        assert_eq!(style.align_self, None);
    }

    #[test]
    fn margin_shorthand_then_side_override() {
        let style = resolve_sheet(&sheet_of(&[
            ("margin", json!(8)),
            ("marginTop", json!(0)),
        ]));
        assert_eq!(style.margin.top, LengthPercentageAuto::from_length(0.0));
        assert_eq!(style.margin.left, LengthPercentageAuto::from_length(8.0));
        assert_eq!(style.margin.right, LengthPercentageAuto::from_length(8.0));
    }

    #[test]
    fn horizontal_and_vertical_shorthands() {
        let style = resolve_sheet(&sheet_of(&[
            ("paddingHorizontal", json!(12)),
            ("paddingVertical", json!(4)),
        ]));
        assert_eq!(style.padding.left, LengthPercentage::from_length(12.0));
        assert_eq!(style.padding.right, LengthPercentage::from_length(12.0));
        assert_eq!(style.padding.top, LengthPercentage::from_length(4.0));
        assert_eq!(style.padding.bottom, LengthPercentage::from_length(4.0));
    }

    #[test]
    fn absolute_position_with_inset() {
        let style = resolve_sheet(&sheet_of(&[
            ("position", json!("absolute")),
            ("top", json!(0)),
            ("left", json!(10)),
        ]));
        assert_eq!(style.position, Position::Absolute);
        assert_eq!(style.inset.top, LengthPercentageAuto::from_length(0.0));
        assert_eq!(style.inset.left, LengthPercentageAuto::from_length(10.0));
        assert_eq!(style.inset.bottom, LengthPercentageAuto::AUTO);
    }

    #[test]
    fn display_none_hides() {
        let style = resolve_sheet(&sheet_of(&[("display", json!("none"))]));
        assert_eq!(style.display, Display::None);
    }

    #[test]
    fn overflow_applies_to_both_axes() {
        let style = resolve_sheet(&sheet_of(&[("overflow", json!("hidden"))]));
        assert_eq!(style.overflow.x, taffy::style::Overflow::Hidden);
        assert_eq!(style.overflow.y, taffy::style::Overflow::Hidden);

        let style = resolve_sheet(&sheet_of(&[("overflow", json!("auto"))]));
        assert_eq!(style.overflow.x, taffy::style::Overflow::Scroll);
    }

    #[test]
    fn gap_shorthand_and_axes() {
        let style = resolve_sheet(&sheet_of(&[("gap", json!(6))]));
        assert_eq!(style.gap.width, LengthPercentage::from_length(6.0));
        assert_eq!(style.gap.height, LengthPercentage::from_length(6.0));

        let style = resolve_sheet(&sheet_of(&[("rowGap", json!(2)), ("columnGap", json!(4))]));
        assert_eq!(style.gap.height, LengthPercentage::from_length(2.0));
        assert_eq!(style.gap.width, LengthPercentage::from_length(4.0));
    }

    #[test]
    fn full_combination() {
        let style = resolve_sheet(&sheet_of(&[
            ("flexDirection", json!("row")),
            ("width", json!("100%")),
            ("height", json!(44)),
            ("padding", json!(8)),
            ("justifyContent", json!("center")),
            ("aspectRatio", json!(1.5)),
        ]));
        assert_eq!(style.flex_direction, FlexDirection::Row);
        assert_eq!(style.size.width, Dimension::from_percent(1.0));
        assert_eq!(style.size.height, Dimension::from_length(44.0));
        assert_eq!(style.padding.top, LengthPercentage::from_length(8.0));
        assert_eq!(style.justify_content, Some(AlignContent::Center));
        assert_eq!(style.aspect_ratio, Some(1.5));
    }
}
