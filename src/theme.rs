//! Color palettes and their resolution from config.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

/// Runtime colors used by the widgets.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_dir_fg: Color,
    pub tree_file_fg: Color,
    pub breadcrumb_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub border_fg: Color,
    pub dialog_bg: Color,
    pub dialog_border_fg: Color,

    // Semantic, not configurable
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

/// Catppuccin Mocha.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(205, 214, 244),
        tree_selected_bg: Color::Rgb(69, 71, 90),
        tree_selected_fg: Color::Rgb(205, 214, 244),
        tree_dir_fg: Color::Rgb(137, 180, 250),
        tree_file_fg: Color::Rgb(205, 214, 244),
        breadcrumb_fg: Color::Rgb(180, 190, 254),
        status_bg: Color::Rgb(30, 30, 46),
        status_fg: Color::Rgb(205, 214, 244),
        border_fg: Color::Rgb(88, 91, 112),
        dialog_bg: Color::Rgb(49, 50, 68),
        dialog_border_fg: Color::Rgb(137, 180, 250),
        error_fg: Color::Rgb(243, 139, 168),
        warning_fg: Color::Rgb(249, 226, 175),
        success_fg: Color::Rgb(166, 227, 161),
        info_fg: Color::Rgb(137, 180, 250),
        accent_fg: Color::Rgb(203, 166, 247),
        dim_fg: Color::Rgb(108, 112, 134),
    }
}

/// Catppuccin Latte.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_fg: Color::Rgb(76, 79, 105),
        tree_selected_bg: Color::Rgb(204, 208, 218),
        tree_selected_fg: Color::Rgb(76, 79, 105),
        tree_dir_fg: Color::Rgb(30, 102, 245),
        tree_file_fg: Color::Rgb(76, 79, 105),
        breadcrumb_fg: Color::Rgb(114, 135, 253),
        status_bg: Color::Rgb(239, 241, 245),
        status_fg: Color::Rgb(76, 79, 105),
        border_fg: Color::Rgb(172, 176, 190),
        dialog_bg: Color::Rgb(230, 233, 239),
        dialog_border_fg: Color::Rgb(30, 102, 245),
        error_fg: Color::Rgb(210, 15, 57),
        warning_fg: Color::Rgb(223, 142, 29),
        success_fg: Color::Rgb(64, 160, 43),
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239),
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

/// Parse `#rrggbb` (the `#` is optional).
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// `"light"`, `"custom"` (dark plus overrides) or dark for anything else.
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    macro_rules! overlay {
        ($($field:ident),* $(,)?) => {
            $(
                if let Some(color) = custom.$field.as_deref().and_then(parse_hex_color) {
                    theme.$field = color;
                }
            )*
        };
    }
    overlay!(
        tree_fg,
        tree_selected_bg,
        tree_selected_fg,
        tree_dir_fg,
        tree_file_fg,
        breadcrumb_fg,
        status_bg,
        status_fg,
        border_fg,
        dialog_bg,
        dialog_border_fg,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_color_accepts_with_and_without_hash() {
        assert_eq!(parse_hex_color("#1a1b26"), Some(Color::Rgb(26, 27, 38)));
        assert_eq!(parse_hex_color("ff0000"), Some(Color::Rgb(255, 0, 0)));
    }

    #[test]
    fn parse_hex_color_rejects_garbage() {
        assert_eq!(parse_hex_color("#zzzzzz"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn default_and_unknown_schemes_are_dark() {
        let dark = dark_theme().tree_dir_fg;
        assert_eq!(resolve_theme(&ThemeConfig::default()).tree_dir_fg, dark);
        let neon = ThemeConfig {
            scheme: Some("neon".into()),
            custom: None,
        };
        assert_eq!(resolve_theme(&neon).tree_dir_fg, dark);
    }

    #[test]
    fn light_scheme() {
        let config = ThemeConfig {
            scheme: Some("light".into()),
            custom: None,
        };
        assert_eq!(resolve_theme(&config).tree_dir_fg, Color::Rgb(30, 102, 245));
    }

    #[test]
    fn custom_overrides_valid_colors_only() {
        let config = ThemeConfig {
            scheme: Some("custom".into()),
            custom: Some(ThemeColorsConfig {
                tree_dir_fg: Some("#7aa2f7".into()),
                border_fg: Some("not a color".into()),
                ..Default::default()
            }),
        };
        let theme = resolve_theme(&config);
        assert_eq!(theme.tree_dir_fg, Color::Rgb(122, 162, 247));
        assert_eq!(theme.border_fg, dark_theme().border_fg);
    }
}
