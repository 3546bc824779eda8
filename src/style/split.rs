//! Layout/paint key classification.
//!
//! Style keys split into two pipelines: layout keys feed the flex solver and
//! can trigger a layout pass; everything else is paint and goes straight to
//! the native view as a prop update. Keys the solver does not understand
//! default to paint, so unknown keys degrade to a harmless forward.

/// Whether `key` affects layout geometry.
pub fn is_layout_key(key: &str) -> bool {
    matches!(
        key,
        "width"
            | "height"
            | "minWidth"
            | "minHeight"
            | "maxWidth"
            | "maxHeight"
            | "flex"
            | "flexGrow"
            | "flexShrink"
            | "flexBasis"
            | "flexDirection"
            | "flexWrap"
            | "justifyContent"
            | "alignItems"
            | "alignSelf"
            | "alignContent"
            | "margin"
            | "marginTop"
            | "marginRight"
            | "marginBottom"
            | "marginLeft"
            | "marginHorizontal"
            | "marginVertical"
            | "padding"
            | "paddingTop"
            | "paddingRight"
            | "paddingBottom"
            | "paddingLeft"
            | "paddingHorizontal"
            | "paddingVertical"
            | "borderWidth"
            | "borderTopWidth"
            | "borderRightWidth"
            | "borderBottomWidth"
            | "borderLeftWidth"
            | "position"
            | "top"
            | "right"
            | "bottom"
            | "left"
            | "display"
            | "overflow"
            | "gap"
            | "rowGap"
            | "columnGap"
            | "aspectRatio"
    )
}

// ===========================================================================
// Tests
// ===========================================================================
