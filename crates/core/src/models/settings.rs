use serde::{Deserialize, Serialize};

/// Display currency. Amounts are shown with this currency's symbol; no
/// exchange-rate conversion is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Cny,
    Jpy,
    Gbp,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Cny | Currency::Jpy => "¥",
            Currency::Gbp => "£",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Cny => "CNY",
            Currency::Jpy => "JPY",
            Currency::Gbp => "GBP",
        };
        write!(f, "{code}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "zh-CN")]
    ZhCn,
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "ja-JP")]
    JaJp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Presentation preferences. Stored under the settings namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub currency: Currency,
    pub language: Language,
    pub theme: Theme,
    pub compact_mode: bool,
    pub show_percentage_change: bool,
    pub show_market_cap: bool,
    pub show_24h_volume: bool,
    /// Live price ticks are skipped while this is off
    pub animations_enabled: bool,
    pub sound_enabled: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency: Currency::Usd,
            language: Language::ZhCn,
            theme: Theme::System,
            compact_mode: false,
            show_percentage_change: true,
            show_market_cap: true,
            show_24h_volume: true,
            animations_enabled: true,
            sound_enabled: true,
        }
    }
}

/// Which notification channels and topics are enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub price_alerts: bool,
    pub portfolio_updates: bool,
    pub news_updates: bool,
    pub system_notifications: bool,
    pub email_notifications: bool,
    pub push_notifications: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            price_alerts: true,
            portfolio_updates: true,
            news_updates: false,
            system_notifications: true,
            email_notifications: false,
            push_notifications: true,
        }
    }
}

/// Names one flag of [`NotificationSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    PriceAlerts,
    PortfolioUpdates,
    NewsUpdates,
    SystemNotifications,
    EmailNotifications,
    PushNotifications,
}

impl NotificationSettings {
    pub fn is_enabled(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::PriceAlerts => self.price_alerts,
            NotificationKind::PortfolioUpdates => self.portfolio_updates,
            NotificationKind::NewsUpdates => self.news_updates,
            NotificationKind::SystemNotifications => self.system_notifications,
            NotificationKind::EmailNotifications => self.email_notifications,
            NotificationKind::PushNotifications => self.push_notifications,
        }
    }
}

/// Full settings document as persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub display: DisplaySettings,
    pub notifications: NotificationSettings,
}

/// Format `amount` with `currency`'s symbol and a B/M/K magnitude suffix.
///
/// `1_234_567.0` in USD → `"$1.23M"`; amounts below 1 000 keep two decimals.
pub fn format_price(amount: f64, currency: Currency) -> String {
    let symbol = currency.symbol();
    if amount >= 1e9 {
        format!("{symbol}{:.2}B", amount / 1e9)
    } else if amount >= 1e6 {
        format!("{symbol}{:.2}M", amount / 1e6)
    } else if amount >= 1e3 {
        format!("{symbol}{:.2}K", amount / 1e3)
    } else {
        format!("{symbol}{amount:.2}")
    }
}
