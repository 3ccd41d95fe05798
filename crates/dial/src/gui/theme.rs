use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;
use rotary::Tone;

/// A themed colour. Named colours are tried in order, libadwaita names before
/// the GTK3 ones, with a fallback and an optional fixed alpha.
struct ColorRole {
    names: &'static [&'static str],
    fallback: (f64, f64, f64, f64),
    alpha: Option<f64>,
}

const SELECTED: ColorRole = ColorRole {
    names: &["accent_bg_color", "theme_selected_bg_color"],
    fallback: (0.21, 0.52, 0.89, 1.0),
    alpha: None,
};

const IN_RANGE: ColorRole = ColorRole {
    names: &["success_color", "accent_color", "theme_selected_bg_color"],
    fallback: (0.2, 0.7, 0.45, 0.9),
    alpha: Some(0.9),
};

const NEUTRAL: ColorRole = ColorRole {
    names: &["window_fg_color", "theme_fg_color"],
    fallback: (0.8, 0.8, 0.8, 0.45),
    alpha: Some(0.45),
};

const FACE: ColorRole = ColorRole {
    names: &["window_bg_color", "theme_bg_color"],
    fallback: (0.15, 0.15, 0.15, 0.85),
    alpha: Some(0.85),
};

const LABEL: ColorRole = ColorRole {
    names: &["window_fg_color", "theme_fg_color"],
    fallback: (0.95, 0.95, 0.95, 1.0),
    alpha: Some(1.0),
};

impl ColorRole {
    fn resolve(&self, lookup: impl Fn(&str) -> Option<Srgba<f64>>) -> Srgba<f64> {
        let color = self
            .names
            .iter()
            .find_map(|name| lookup(name))
            .unwrap_or_else(|| Srgba::from_components(self.fallback));
        match self.alpha {
            Some(alpha) => Srgba::new(color.red, color.green, color.blue, alpha),
            None => color,
        }
    }
}

pub struct ThemeColors {
    pub selected: Srgba<f64>,
    pub in_range: Srgba<f64>,
    pub neutral: Srgba<f64>,
    pub face: Srgba<f64>,
    pub label: Srgba<f64>,
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        let lookup = |name: &str| {
            context.lookup_color(name).map(|c| {
                Srgba::new(
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    c.alpha() as f64,
                )
            })
        };
        Self::resolve(lookup)
    }

    fn resolve(lookup: impl Fn(&str) -> Option<Srgba<f64>> + Copy) -> Self {
        Self {
            selected: SELECTED.resolve(lookup),
            in_range: IN_RANGE.resolve(lookup),
            neutral: NEUTRAL.resolve(lookup),
            face: FACE.resolve(lookup),
            label: LABEL.resolve(lookup),
        }
    }

    pub fn tone(&self, tone: Tone) -> Srgba<f64> {
        match tone {
            Tone::Selected => self.selected,
            Tone::InRange => self.in_range,
            Tone::Neutral => self.neutral,
        }
    }
}

/// The dial draws its own round face, so the window behind it stays clear.
const DIAL_CSS: &str = "
.dial-window, .dial-drawing-area {
    background: none;
    background-color: transparent;
    box-shadow: none;
}
";

pub fn load_css(display: &gdk::Display) {
    let provider = gtk::CssProvider::new();
    provider.load_from_data(DIAL_CSS);
    gtk::style_context_add_provider_for_display(
        display,
        &provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_names_tried_in_order() {
        let red = Srgba::new(1.0, 0.0, 0.0, 1.0);
        let blue = Srgba::new(0.0, 0.0, 1.0, 0.5);
        // a GTK3 theme: only the legacy names exist
        let colors = ThemeColors::resolve(|name| match name {
            "theme_selected_bg_color" => Some(red),
            "theme_fg_color" => Some(blue),
            _ => None,
        });

        assert_eq!(colors.selected, red);
        assert_eq!(colors.in_range, Srgba::new(1.0, 0.0, 0.0, 0.9));
        assert_eq!(colors.neutral, Srgba::new(0.0, 0.0, 1.0, 0.45));
        assert_eq!(colors.face, Srgba::from_components(FACE.fallback));
        assert_eq!(colors.tone(Tone::Selected), colors.selected);
    }

    #[test]
    fn test_first_defined_name_wins() {
        let green = Srgba::new(0.0, 1.0, 0.0, 1.0);
        let colors = ThemeColors::resolve(|name| (name == "accent_bg_color").then_some(green));
        assert_eq!(colors.selected, green);
        assert_eq!(colors.label, Srgba::from_components(LABEL.fallback));
    }
}
