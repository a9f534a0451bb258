//! Economic calendar cards. The figures are maintained by hand.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CalendarItem {
    pub icon: &'static str,
    pub name: &'static str,
    pub current: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<&'static str>,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_meeting: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_release: Option<&'static str>,
    pub description: &'static str,
}

pub fn economic_calendar() -> BTreeMap<&'static str, CalendarItem> {
    BTreeMap::from([
        (
            "fed_rate",
            CalendarItem {
                icon: "🏦",
                name: "FED Faiz Kararı",
                current: "4.50%",
                previous: None,
                color: "#3b82f6",
                next_meeting: Some("2025-03-19"),
                next_release: None,
                description: "ABD Merkez Bankası politika faizi",
            },
        ),
        (
            "nonfarm_payroll",
            CalendarItem {
                icon: "👷",
                name: "Tarım Dışı İstihdam",
                current: "256K",
                previous: Some("227K"),
                color: "#10b981",
                next_meeting: None,
                next_release: Some("2025-02-07"),
                description: "Önceki: 227K",
            },
        ),
        (
            "unemployment",
            CalendarItem {
                icon: "📉",
                name: "İşsizlik Oranı",
                current: "4.1%",
                previous: Some("4.2%"),
                color: "#f59e0b",
                next_meeting: None,
                next_release: Some("2025-02-07"),
                description: "Önceki: 4.2%",
            },
        ),
        (
            "inflation",
            CalendarItem {
                icon: "📈",
                name: "Enflasyon (CPI)",
                current: "2.9%",
                previous: Some("2.7%"),
                color: "#ef4444",
                next_meeting: None,
                next_release: Some("2025-02-12"),
                description: "Önceki: 2.7%",
            },
        ),
    ])
}
