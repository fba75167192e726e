//! OS color-scheme preference.
//!
//! There is no portable API for this, so detection is a chain of heuristics.
//! Each returns `None` when it has nothing to say and the next one is tried.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Dark,
    Light,
}

/// `Some(true)` when the OS prefers a dark color scheme, `None` if unknown.
pub fn prefers_dark() -> Option<bool> {
    detect().map(|scheme| scheme == ColorScheme::Dark)
}

pub fn detect() -> Option<ColorScheme> {
    let scheme = std::env::var("GTK_THEME")
        .ok()
        .and_then(|theme| scheme_from_gtk_theme(&theme))
        .or_else(|| {
            std::env::var("COLORFGBG")
                .ok()
                .and_then(|value| scheme_from_colorfgbg(&value))
        })
        .or_else(platform_scheme);

    log::debug!("Detected OS color scheme: {:?}", scheme);
    scheme
}

/// `GTK_THEME` values look like `Adwaita:dark` or `Yaru-dark`.
pub fn scheme_from_gtk_theme(theme: &str) -> Option<ColorScheme> {
    let theme = theme.trim().to_ascii_lowercase();
    if theme.is_empty() {
        return None;
    }
    if theme.ends_with(":dark") || theme.contains("-dark") {
        Some(ColorScheme::Dark)
    } else {
        Some(ColorScheme::Light)
    }
}

/// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`) in ANSI color indices.
/// Backgrounds 0-6 and 8 are the dark half of the palette.
pub fn scheme_from_colorfgbg(value: &str) -> Option<ColorScheme> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match background {
        0..=6 | 8 => Some(ColorScheme::Dark),
        _ => Some(ColorScheme::Light),
    }
}

#[cfg(target_os = "macos")]
fn platform_scheme() -> Option<ColorScheme> {
    // Only set when dark mode is on; the key is absent in light mode.
    let output = std::process::Command::new("defaults")
        .args(["read", "-g", "AppleInterfaceStyle"])
        .output()
        .ok()?;
    let style = String::from_utf8_lossy(&output.stdout);
    if output.status.success() && style.trim().eq_ignore_ascii_case("dark") {
        Some(ColorScheme::Dark)
    } else {
        Some(ColorScheme::Light)
    }
}

#[cfg(target_os = "linux")]
fn platform_scheme() -> Option<ColorScheme> {
    let home = dirs::home_dir()?;
    scheme_from_gimp_theme(&home.join(".config/GIMP/3.0/theme.css"))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn platform_scheme() -> Option<ColorScheme> {
    None
}

/// GIMP 3 writes the active theme import into its user `theme.css`.
pub fn scheme_from_gimp_theme(theme_css: &Path) -> Option<ColorScheme> {
    let contents = std::fs::read_to_string(theme_css).ok()?;
    if contents.contains("themes/Default/gimp-dark.css") {
        Some(ColorScheme::Dark)
    } else {
        Some(ColorScheme::Light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gtk_theme() {
        assert_eq!(scheme_from_gtk_theme("Adwaita:dark"), Some(ColorScheme::Dark));
        assert_eq!(scheme_from_gtk_theme("Yaru-dark"), Some(ColorScheme::Dark));
        assert_eq!(scheme_from_gtk_theme("Adwaita"), Some(ColorScheme::Light));
        assert_eq!(scheme_from_gtk_theme("  "), None);
    }

    #[test]
    fn test_colorfgbg() {
        assert_eq!(scheme_from_colorfgbg("15;0"), Some(ColorScheme::Dark));
        assert_eq!(scheme_from_colorfgbg("0;default;15"), Some(ColorScheme::Light));
        assert_eq!(scheme_from_colorfgbg("7;8"), Some(ColorScheme::Dark));
        assert_eq!(scheme_from_colorfgbg("garbage"), None);
    }

    #[test]
    fn test_gimp_theme_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let theme = dir.path().join("theme.css");

        assert_eq!(scheme_from_gimp_theme(&theme), None);

        std::fs::write(&theme, "@import url(\"/usr/share/gimp/3.0/themes/Default/gimp-dark.css\");")?;
        assert_eq!(scheme_from_gimp_theme(&theme), Some(ColorScheme::Dark));

        std::fs::write(&theme, "@import url(\"themes/Default/gimp-light.css\");")?;
        assert_eq!(scheme_from_gimp_theme(&theme), Some(ColorScheme::Light));
        Ok(())
    }
}
