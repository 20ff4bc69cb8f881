//! Kiosk menu and app pages.
//!
//! The connection server only needs something implementing
//! [`PageRenderer`]; [`KioskPages`] is the bundled tile menu.

use std::fmt::Write as _;

use serde::Serialize;

use crate::camera_api::PATH_STREAM;
use crate::ptz::envelope::xml_escape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    English,
    #[default]
    French,
}

impl Language {
    /// `en` / `fr`, ignoring ASCII case. Anything else is `None`.
    pub fn from_query(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("en") {
            Some(Language::English)
        } else if value.eq_ignore_ascii_case("fr") {
            Some(Language::French)
        } else {
            None
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
        }
    }
}

/// Produces the HTML and JSON the kiosk serves.
pub trait PageRenderer: Send + Sync {
    fn menu_page(&self, lang: Language) -> String;

    fn menu_json(&self, lang: Language) -> String;

    /// Page for `/apps/<app>`, or `None` if there is no such local app.
    fn app_page(&self, app: &str, lang: Language) -> Option<String>;
}

/// One tile of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTile {
    pub name: &'static str,
    pub accent: &'static str,
    pub icon: &'static str,
    /// Where the tile navigates; empty tiles are rendered disabled.
    pub route: &'static str,
}

pub const DEFAULT_APPS: [AppTile; 7] = [
    AppTile { name: "BeaverPhone", accent: "violet", icon: "icons/phone.svg", route: "/apps/beaverphone" },
    AppTile { name: "BeaverSystem", accent: "cyan", icon: "icons/server.svg", route: "/apps/beaversystem" },
    AppTile { name: "BeaverAlarm", accent: "amber", icon: "icons/shield-alert.svg", route: "/apps/beaveralarm" },
    AppTile { name: "BeaverTask", accent: "red", icon: "icons/square-check-big.svg", route: "" },
    AppTile { name: "BeaverDoc", accent: "green", icon: "icons/file-text.svg", route: "http://localhost:8000" },
    AppTile { name: "BeaverDebian", accent: "violet", icon: "icons/server-cog.svg", route: "http://localhost:9090/" },
    AppTile { name: "BeaverNet", accent: "amber", icon: "icons/chromium.svg", route: "https://rgbeavernet.ca/" },
];

/// English → French labels. Missing entries fall back to English.
const FRENCH: &[(&str, &str)] = &[
    ("Welcome", "Bienvenue"),
    ("to the", "au"),
    ("Language selection", "Sélection de la langue"),
    ("Switch to French", "Passer en français"),
    ("Switch to English", "Passer en anglais"),
    ("Back to menu", "Retour au menu"),
    ("BeaverPhone", "BeaverTéléphone"),
    ("BeaverSystem", "BeaverSystème"),
    ("BeaverAlarm", "BeaverAlarme"),
    ("BeaverTask", "BeaverTâche"),
    ("Dialpad", "Clavier"),
    ("Enter a number", "Entrez un numéro"),
    ("Call", "Appeler"),
    ("Clear", "Effacer"),
    ("Camera", "Caméra"),
    ("Camera controls", "Commandes de la caméra"),
    ("Left", "Gauche"),
    ("Right", "Droite"),
    ("Up", "Haut"),
    ("Down", "Bas"),
    ("Zoom in", "Zoom avant"),
    ("Zoom out", "Zoom arrière"),
    ("Stop", "Arrêt"),
    ("System status", "État du système"),
];

fn translate(text: &'static str, lang: Language) -> &'static str {
    match lang {
        Language::English => text,
        Language::French => FRENCH
            .iter()
            .find(|(en, _)| *en == text)
            .map_or(text, |(_, fr)| *fr),
    }
}

#[derive(Serialize)]
struct MenuJson<'a> {
    apps: Vec<MenuEntry<'a>>,
}

#[derive(Serialize)]
struct MenuEntry<'a> {
    name: &'a str,
    accent: &'a str,
    icon: &'a str,
}

/// Bundled tile menu with local BeaverPhone, BeaverSystem and BeaverAlarm
/// pages.
#[derive(Debug, Clone)]
pub struct KioskPages {
    apps: Vec<AppTile>,
}

impl Default for KioskPages {
    fn default() -> Self {
        Self {
            apps: DEFAULT_APPS.to_vec(),
        }
    }
}

impl KioskPages {
    fn tile(&self, app: &AppTile, lang: Language) -> String {
        let label = xml_escape(translate(app.name, lang));
        let inner = format!(
            r#"<img class="app-tile__icon" src="/{icon}" alt="" /><span class="app-tile__label">{label}</span>"#,
            icon = app.icon,
        );
        if app.route.is_empty() {
            return format!(
                r#"<button class="app-tile app-tile--{accent}" disabled>{inner}</button>"#,
                accent = app.accent,
            );
        }

        let href = if app.route.starts_with('/') {
            format!("{}?lang={}", app.route, lang.code())
        } else {
            app.route.to_string()
        };
        format!(
            r#"<a class="app-tile app-tile--{accent}" href="{href}">{inner}</a>"#,
            accent = app.accent,
            href = xml_escape(&href),
        )
    }

    fn beaverphone(&self, lang: Language) -> String {
        let mut keys = String::new();
        for key in ["1", "2", "3", "4", "5", "6", "7", "8", "9", "*", "0", "#"] {
            let _ = write!(keys, r#"<button class="dialpad-key" data-key="{key}">{key}</button>"#);
        }
        let body = format!(
            concat!(
                r#"<section class="dialpad-card"><h2>{dialpad}</h2>"#,
                r#"<input class="dialpad-display" placeholder="{enter}" readonly />"#,
                r#"<div class="dialpad-grid">{keys}</div>"#,
                r#"<div class="dialpad-actions"><button class="call">{call}</button><button class="clear">{clear}</button></div>"#,
                "</section>"
            ),
            dialpad = translate("Dialpad", lang),
            enter = translate("Enter a number", lang),
            keys = keys,
            call = translate("Call", lang),
            clear = translate("Clear", lang),
        );
        page_shell(lang, translate("BeaverPhone", lang), "/apps/beaverphone", &body)
    }

    fn beaveralarm(&self, lang: Language) -> String {
        let mut buttons = String::new();
        for (action, label) in [
            ("left", "Left"),
            ("right", "Right"),
            ("up", "Up"),
            ("down", "Down"),
            ("zoom_in", "Zoom in"),
            ("zoom_out", "Zoom out"),
            ("stop", "Stop"),
        ] {
            let _ = write!(
                buttons,
                r#"<button class="ptz-button" data-action="{action}">{}</button>"#,
                translate(label, lang)
            );
        }
        let body = format!(
            concat!(
                r#"<section class="camera-card" data-stream="{stream}"><h2>{camera}</h2>"#,
                r#"<video class="camera-feed" autoplay muted playsinline></video>"#,
                r#"<nav class="ptz-controls" aria-label="{controls}">{buttons}</nav>"#,
                "</section>"
            ),
            stream = PATH_STREAM,
            camera = translate("Camera", lang),
            controls = translate("Camera controls", lang),
            buttons = buttons,
        );
        page_shell(lang, translate("BeaverAlarm", lang), "/apps/beaveralarm", &body)
    }

    fn beaversystem(&self, lang: Language) -> String {
        let body = format!(
            r#"<section class="system-card"><h2>{}</h2><p class="system-version">beaver-kiosk {}</p></section>"#,
            translate("System status", lang),
            env!("CARGO_PKG_VERSION"),
        );
        page_shell(lang, translate("BeaverSystem", lang), "/apps/beaversystem", &body)
    }
}

impl PageRenderer for KioskPages {
    fn menu_page(&self, lang: Language) -> String {
        let tiles: String = self.apps.iter().map(|app| self.tile(app, lang)).collect();
        let header = format!(
            concat!(
                r#"<header class="menu-header"><h1 class="menu-header__title">"#,
                r#"<span class="menu-header__welcome">{welcome}</span> "#,
                r#"<span class="menu-header__connector">{to_the}</span> "#,
                r#"<span class="menu-header__brand">BeaverKiosk</span></h1>{toggle}</header>"#
            ),
            welcome = translate("Welcome", lang),
            to_the = translate("to the", lang),
            toggle = language_toggle(lang, ""),
        );
        document(
            lang,
            "BeaverKiosk",
            &format!(r#"<div class="menu-root">{header}<main class="menu-grid">{tiles}</main></div>"#),
        )
    }

    fn menu_json(&self, lang: Language) -> String {
        let menu = MenuJson {
            apps: self
                .apps
                .iter()
                .map(|app| MenuEntry {
                    name: translate(app.name, lang),
                    accent: app.accent,
                    icon: app.icon,
                })
                .collect(),
        };
        serde_json::to_string(&menu).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode menu JSON");
            r#"{"apps":[]}"#.to_string()
        })
    }

    fn app_page(&self, app: &str, lang: Language) -> Option<String> {
        let page = match app.to_ascii_lowercase().as_str() {
            "beaverphone" => self.beaverphone(lang),
            "beaveralarm" => self.beaveralarm(lang),
            "beaversystem" => self.beaversystem(lang),
            _ => return None,
        };
        tracing::debug!(app, lang = lang.code(), bytes = page.len(), "rendered app page");
        Some(page)
    }
}

fn language_toggle(lang: Language, base: &str) -> String {
    let button = |target: Language, label: &str, title: &str| {
        let active = if target == lang { " lang-toggle__button--active" } else { "" };
        format!(
            r#"<a class="lang-toggle__button{active}" href="{base}?lang={code}" title="{title}">{label}</a>"#,
            code = target.code(),
        )
    };
    format!(
        r#"<nav class="lang-toggle" role="group" aria-label="{}">{}{}</nav>"#,
        translate("Language selection", lang),
        button(Language::French, "FR", translate("Switch to French", lang)),
        button(Language::English, "EN", translate("Switch to English", lang)),
    )
}

fn page_shell(lang: Language, title: &str, base: &str, body: &str) -> String {
    let content = format!(
        concat!(
            r#"<div class="app-root"><header class="app-header">"#,
            r#"<a class="back-link" href="/?lang={code}">{back}</a>"#,
            r#"<h1>{title}</h1>{toggle}</header><main>{body}</main></div>"#
        ),
        code = lang.code(),
        back = translate("Back to menu", lang),
        title = title,
        toggle = language_toggle(lang, base),
        body = body,
    );
    document(lang, &format!("{title} - BeaverKiosk"), &content)
}

fn document(lang: Language, title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"{code}\">\n",
            "<head>\n",
            "  <meta charset=\"UTF-8\" />\n",
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\" />\n",
            "  <title>{title}</title>\n",
            "  <link rel=\"stylesheet\" href=\"/css/styles.css\" />\n",
            "</head>\n",
            "<body>\n<div id=\"root\">{body}</div>\n</body>\n",
            "</html>\n"
        ),
        code = lang.code(),
        title = title,
        body = body,
    )
}
